//! Worker Loop (C8): claim → heartbeat → download → dispatch → upload →
//! complete/fail, matching the state machine in spec.md §4.8.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Notify;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::blob::BlobTransfer;
use crate::compression::CompressionConfig;
use crate::config::WorkerConfig;
use crate::dispatch;
use crate::error::{WorkerError, WorkerResult};
use crate::models::{JobDescriptor, OutputRef, WorkerIdentity};
use crate::naming;
use crate::ops::ToolContext;
use crate::queue::QueueClient;
use crate::scratch::ScratchDir;
use crate::web_fetch::SafeWebFetcher;

/// Runs the claim/process loop forever. Only returns on an unrecoverable
/// startup-level error; per-job failures are reported to the queue and the
/// loop continues.
pub async fn run(config: WorkerConfig, queue: QueueClient, blob: BlobTransfer) -> WorkerResult<()> {
    let identity = WorkerIdentity {
        worker_id: config.worker_id.clone(),
        worker_token: config.worker_token.clone(),
    };
    let compression_config = CompressionConfig::from_env();
    let web_fetcher = SafeWebFetcher::new(config.web_allow_hostname_fallback);
    let poll_interval = Duration::from_secs(config.poll_interval_seconds.max(1));

    loop {
        match queue.claim_next_job(&identity).await {
            Ok(Some(job)) => {
                process_job(
                    &queue,
                    &blob,
                    &identity,
                    &config,
                    &compression_config,
                    &web_fetcher,
                    job,
                )
                .await;
            }
            Ok(None) => {
                sleep(poll_interval).await;
            }
            Err(err) => {
                error!(error = %err.message(), "claim_next_job failed; backing off before retry");
                sleep(poll_interval).await;
            }
        }
    }
}

async fn process_job(
    queue: &QueueClient,
    blob: &BlobTransfer,
    identity: &WorkerIdentity,
    worker_config: &WorkerConfig,
    compression_config: &CompressionConfig,
    web_fetcher: &SafeWebFetcher,
    job: JobDescriptor,
) {
    let job_id = job.id.clone();
    let started = Instant::now();
    let progress = Arc::new(AtomicU32::new(10));
    let stop = Arc::new(Notify::new());

    let heartbeat = spawn_heartbeat(
        queue.clone(),
        identity.clone(),
        job_id.clone(),
        Duration::from_secs(worker_config.heartbeat_interval_seconds.max(1)),
        progress.clone(),
        stop.clone(),
    );

    let result = run_job(queue, blob, identity, worker_config, compression_config, web_fetcher, &job, &progress).await;

    stop.notify_one();
    let _ = tokio::time::timeout(Duration::from_secs(1), heartbeat).await;

    match result {
        Ok((outputs, bytes_processed)) => {
            let minutes_used = (started.elapsed().as_secs_f64() / 60.0).max(0.01);
            if let Err(err) = queue
                .complete_job(identity, &job_id, &outputs, minutes_used, bytes_processed)
                .await
            {
                error!(job_id, error = %err.message(), "failed to report job completion");
                return;
            }
            if let Err(err) = report_progress(queue, identity, &job_id, 100).await {
                warn!(job_id, error = %err.message(), "failed to report final progress");
            }
        }
        Err(err) => safe_fail(queue, identity, &job_id, &err).await,
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_job(
    queue: &QueueClient,
    blob: &BlobTransfer,
    identity: &WorkerIdentity,
    worker_config: &WorkerConfig,
    compression_config: &CompressionConfig,
    web_fetcher: &SafeWebFetcher,
    job: &JobDescriptor,
    progress: &Arc<AtomicU32>,
) -> WorkerResult<(Vec<OutputRef>, u64)> {
    report_progress(queue, identity, &job.id, 10).await?;
    progress.store(10, Ordering::SeqCst);

    let scratch = ScratchDir::new()?;
    let mut input_paths = Vec::with_capacity(job.inputs.len());
    let mut input_names = Vec::with_capacity(job.inputs.len());
    let mut bytes_processed: u64 = 0;

    for (index, input) in job.inputs.iter().enumerate() {
        let dest = scratch.input_path(index + 1, &input.filename);
        let size = blob
            .download(queue, &input.storage_id, &identity.worker_token, &dest)
            .await?;
        bytes_processed += size;
        input_paths.push(dest);
        input_names.push(naming_source(&input.filename));
    }

    progress.store(40, Ordering::SeqCst);
    report_progress(queue, identity, &job.id, 40).await?;

    let config_map = job.config_object();
    let ctx = ToolContext {
        scratch: &scratch,
        inputs: &input_paths,
        input_names: &input_names,
        config: &config_map,
        compression_config,
        worker_config,
        web_fetcher,
    };

    let output_paths = dispatch::dispatch(job.tool, &ctx).await?;

    progress.store(75, Ordering::SeqCst);
    report_progress(queue, identity, &job.id, 75).await?;

    let mut outputs = Vec::with_capacity(output_paths.len());
    for path in &output_paths {
        let storage_id = blob.upload(queue, path, &identity.worker_token).await?;
        let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        outputs.push(OutputRef {
            storage_id,
            filename,
            size_bytes,
        });
    }

    Ok((outputs, bytes_processed))
}

fn naming_source(filename: &str) -> String {
    naming::logical_stem(filename)
}

async fn report_progress(queue: &QueueClient, identity: &WorkerIdentity, job_id: &str, value: u32) -> WorkerResult<()> {
    queue.report_job_progress(identity, job_id, value).await
}

fn spawn_heartbeat(
    queue: QueueClient,
    identity: WorkerIdentity,
    job_id: String,
    interval: Duration,
    progress: Arc<AtomicU32>,
    stop: Arc<Notify>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop.notified() => break,
                _ = sleep(interval) => {
                    let value = progress.load(Ordering::SeqCst);
                    if let Err(err) = queue.report_job_progress(&identity, &job_id, value).await {
                        warn!(job_id, error = %err.message(), "heartbeat progress report failed");
                    }
                }
            }
        }
    })
}

/// Failure reporting is wrapped so that a second failure (e.g. the queue
/// itself being unreachable) cannot crash the worker loop (spec.md §4.8
/// step 4).
async fn safe_fail(queue: &QueueClient, identity: &WorkerIdentity, job_id: &str, err: &WorkerError) {
    info!(job_id, code = err.code(), message = err.message(), "job failed");
    if let Err(report_err) = queue.fail_job(identity, job_id, err.code(), err.message()).await {
        error!(job_id, error = %report_err.message(), "failed to report job failure");
    }
}

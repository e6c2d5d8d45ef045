//! zenpdf-worker: claims PDF-processing jobs from a Convex-backed queue,
//! runs them, and reports results back.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zenpdf_worker::blob::BlobTransfer;
use zenpdf_worker::config::WorkerConfig;
use zenpdf_worker::queue::QueueClient;
use zenpdf_worker::worker;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zenpdf_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env()?;
    let queue = QueueClient::new(config.convex_url.clone(), Some(config.worker_token.clone()))?;
    let blob = BlobTransfer::new()?;

    tracing::info!(worker_id = %config.worker_id, "starting zenpdf-worker");
    worker::run(config, queue, blob).await?;
    Ok(())
}

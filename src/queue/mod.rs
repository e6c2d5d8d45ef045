//! Queue Client (C1): job leasing, heartbeats, and terminal reporting over
//! the Convex-style RPC envelope.

mod client;
mod envelope;

pub use client::QueueClient;
pub use envelope::methods;

use serde::Deserialize;
use serde_json::json;

use crate::error::WorkerResult;
use crate::models::{JobDescriptor, OutputRef, WorkerIdentity};

impl QueueClient {
    pub async fn claim_next_job(
        &self,
        identity: &WorkerIdentity,
    ) -> WorkerResult<Option<JobDescriptor>> {
        let value = self
            .query(
                methods::CLAIM_NEXT_JOB,
                json!({
                    "workerId": identity.worker_id,
                    "workerToken": identity.worker_token,
                }),
            )
            .await?;

        if value.is_null() {
            return Ok(None);
        }

        let job: JobDescriptor = serde_json::from_value(value)?;
        Ok(Some(job))
    }

    pub async fn report_job_progress(
        &self,
        identity: &WorkerIdentity,
        job_id: &str,
        progress: u32,
    ) -> WorkerResult<()> {
        self.mutation(
            methods::REPORT_JOB_PROGRESS,
            json!({
                "jobId": job_id,
                "workerId": identity.worker_id,
                "progress": progress,
                "workerToken": identity.worker_token,
            }),
        )
        .await?;
        Ok(())
    }

    pub async fn complete_job(
        &self,
        identity: &WorkerIdentity,
        job_id: &str,
        outputs: &[OutputRef],
        minutes_used: f64,
        bytes_processed: u64,
    ) -> WorkerResult<()> {
        self.mutation(
            methods::COMPLETE_JOB,
            json!({
                "jobId": job_id,
                "workerId": identity.worker_id,
                "outputs": outputs,
                "minutesUsed": minutes_used,
                "bytesProcessed": bytes_processed,
                "workerToken": identity.worker_token,
            }),
        )
        .await?;
        Ok(())
    }

    pub async fn fail_job(
        &self,
        identity: &WorkerIdentity,
        job_id: &str,
        error_code: &str,
        error_message: &str,
    ) -> WorkerResult<()> {
        self.mutation(
            methods::FAIL_JOB,
            json!({
                "jobId": job_id,
                "workerId": identity.worker_id,
                "errorCode": error_code,
                "errorMessage": error_message,
                "workerToken": identity.worker_token,
            }),
        )
        .await?;
        Ok(())
    }

    pub async fn get_download_url(&self, storage_id: &str, worker_token: &str) -> WorkerResult<String> {
        let value = self
            .query(
                methods::GET_DOWNLOAD_URL,
                json!({ "storageId": storage_id, "workerToken": worker_token }),
            )
            .await?;
        let url: String = serde_json::from_value(value)?;
        Ok(url)
    }

    pub async fn get_upload_url(&self, worker_token: &str) -> WorkerResult<String> {
        let value = self
            .mutation(methods::GET_UPLOAD_URL, json!({ "workerToken": worker_token }))
            .await?;
        let url: String = serde_json::from_value(value)?;
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    #[serde(rename = "storageId")]
    pub storage_id: String,
}

//! Blob Transfer (C2): streaming download/upload against the queue's
//! storage URLs.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{WorkerError, WorkerResult};
use crate::queue::{QueueClient, UploadResponse};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);
const DOWNLOAD_CHUNK_HINT: usize = 1024 * 1024;

pub struct BlobTransfer {
    client: Client,
}

impl BlobTransfer {
    pub fn new() -> WorkerResult<Self> {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| WorkerError::transient(format!("failed to build blob client: {e}")))?;
        Ok(Self { client })
    }

    /// Query the queue for a short-lived download URL, then stream the body
    /// into `dest` a megabyte at a time.
    pub async fn download(
        &self,
        queue: &QueueClient,
        storage_id: &str,
        worker_token: &str,
        dest: &Path,
    ) -> WorkerResult<u64> {
        let url = queue.get_download_url(storage_id, worker_token).await?;

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WorkerError::transient(format!("blob download request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WorkerError::transient(format!(
                "blob download returned status {}",
                response.status()
            )));
        }

        let mut file = File::create(dest)
            .await
            .map_err(|e| WorkerError::transient(format!("cannot create download target: {e}")))?;

        let mut stream = response.bytes_stream();
        let mut total: u64 = 0;
        let mut pending = Vec::with_capacity(DOWNLOAD_CHUNK_HINT);

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                WorkerError::transient(format!("blob download stream failed: {e}"))
            })?;
            total += chunk.len() as u64;
            pending.extend_from_slice(&chunk);
            if pending.len() >= DOWNLOAD_CHUNK_HINT {
                file.write_all(&pending).await?;
                pending.clear();
            }
        }
        if !pending.is_empty() {
            file.write_all(&pending).await?;
        }
        file.flush().await?;

        Ok(total)
    }

    /// Obtain an upload URL from the queue and stream the file as
    /// `application/octet-stream`, returning the storage id the queue
    /// assigned.
    pub async fn upload(&self, queue: &QueueClient, path: &Path, worker_token: &str) -> WorkerResult<String> {
        let url = queue.get_upload_url(worker_token).await?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| WorkerError::transient(format!("cannot read upload source: {e}")))?;

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| WorkerError::transient(format!("blob upload request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WorkerError::transient(format!(
                "blob upload returned status {}",
                response.status()
            )));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| WorkerError::transient(format!("blob upload returned unparseable body: {e}")))?;

        Ok(parsed.storage_id)
    }
}

impl Default for BlobTransfer {
    fn default() -> Self {
        Self::new().expect("default blob transfer client")
    }
}

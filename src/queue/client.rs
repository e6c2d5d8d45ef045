//! RPC facade over the queue's HTTPS endpoint.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};

use super::envelope::{RpcRequest, RpcResponse};

const USER_AGENT: &str = concat!("zenpdf-worker/", env!("CARGO_PKG_VERSION"));

/// Two operations, `query` and `mutation`, both POSTing the same envelope
/// shape. A single mutex serializes issuance since this client is shared
/// between the worker's main path and its heartbeat task.
#[derive(Clone)]
pub struct QueueClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    inflight: Arc<Mutex<()>>,
}

impl QueueClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> WorkerResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WorkerError::transient(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
            inflight: Arc::new(Mutex::new(())),
        })
    }

    pub async fn query(&self, path: &str, args: Value) -> WorkerResult<Value> {
        self.call(path, args).await
    }

    pub async fn mutation(&self, path: &str, args: Value) -> WorkerResult<Value> {
        self.call(path, args).await
    }

    async fn call(&self, path: &str, args: Value) -> WorkerResult<Value> {
        let _guard = self.inflight.lock().await;

        let body = RpcRequest::new(path, args);
        debug!(path, "issuing queue rpc");

        let mut request = self
            .client
            .post(&self.base_url)
            .header("Content-Type", "application/json")
            .header("Convex-Client", "zenpdf-worker")
            .json(&body);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WorkerError::transient(format!("queue rpc {path} failed: {e}")))?;

        let status = response.status();
        if status != StatusCode::OK && status.as_u16() != 560 {
            return Err(WorkerError::transient(format!(
                "queue rpc {path} returned unexpected status {status}"
            )));
        }

        let parsed: RpcResponse = response.json().await.map_err(|e| {
            WorkerError::transient(format!("queue rpc {path} returned unparseable body: {e}"))
        })?;

        match parsed {
            RpcResponse::Success { value } => Ok(value),
            RpcResponse::Error {
                error_message,
                error_data,
            } => Err(WorkerError::user(format!(
                "queue rpc {path} rejected: {error_message} ({error_data})"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::envelope::RpcRequest;
    use serde_json::json;

    #[test]
    fn request_envelope_matches_wire_shape() {
        let req = RpcRequest::new("jobs:claimNextJob", json!({"workerId": "w1"}));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["path"], "jobs:claimNextJob");
        assert_eq!(value["format"], "convex_encoded_json");
        assert_eq!(value["args"][0]["workerId"], "w1");
    }
}

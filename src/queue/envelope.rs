//! Wire shapes for the Convex-style RPC envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub path: &'a str,
    pub format: &'static str,
    pub args: [Value; 1],
}

impl<'a> RpcRequest<'a> {
    pub fn new(path: &'a str, args: Value) -> Self {
        Self {
            path,
            format: "convex_encoded_json",
            args: [args],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RpcResponse {
    Success {
        #[serde(default)]
        value: Value,
    },
    Error {
        #[serde(rename = "errorMessage", default)]
        error_message: String,
        #[serde(rename = "errorData", default)]
        error_data: Value,
    },
}

pub mod methods {
    pub const CLAIM_NEXT_JOB: &str = "jobs:claimNextJob";
    pub const REPORT_JOB_PROGRESS: &str = "jobs:reportJobProgress";
    pub const COMPLETE_JOB: &str = "jobs:completeJob";
    pub const FAIL_JOB: &str = "jobs:failJob";
    pub const GET_DOWNLOAD_URL: &str = "files:getDownloadUrl";
    pub const GET_UPLOAD_URL: &str = "files:generateUploadUrl";
}

//! Error taxonomy: every failure a job can hit collapses into either a
//! [`WorkerError::User`] (the input or requested config is bad — reported to
//! the queue as `USER_INPUT_INVALID` and never retried) or a
//! [`WorkerError::Transient`] (the environment failed us — reported as
//! `SERVICE_CAPACITY_TEMPORARY` and safe to retry on another worker).

use thiserror::Error;

pub const USER_INPUT_INVALID: &str = "USER_INPUT_INVALID";
pub const SERVICE_CAPACITY_TEMPORARY: &str = "SERVICE_CAPACITY_TEMPORARY";

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("{0}")]
    User(String),

    #[error("{0}")]
    Transient(String),
}

impl WorkerError {
    pub fn user(msg: impl Into<String>) -> Self {
        WorkerError::User(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        WorkerError::Transient(msg.into())
    }

    /// The code reported to the queue's `jobs:failJob` mutation.
    pub fn code(&self) -> &'static str {
        match self {
            WorkerError::User(_) => USER_INPUT_INVALID,
            WorkerError::Transient(_) => SERVICE_CAPACITY_TEMPORARY,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            WorkerError::User(msg) | WorkerError::Transient(msg) => msg,
        }
    }
}

pub type WorkerResult<T> = Result<T, WorkerError>;

impl From<std::io::Error> for WorkerError {
    fn from(err: std::io::Error) -> Self {
        WorkerError::Transient(format!("io error: {err}"))
    }
}

impl From<reqwest::Error> for WorkerError {
    fn from(err: reqwest::Error) -> Self {
        WorkerError::Transient(format!("http error: {err}"))
    }
}

impl From<serde_json::Error> for WorkerError {
    fn from(err: serde_json::Error) -> Self {
        WorkerError::Transient(format!("json error: {err}"))
    }
}

impl From<tokio::task::JoinError> for WorkerError {
    fn from(err: tokio::task::JoinError) -> Self {
        WorkerError::Transient(format!("task join error: {err}"))
    }
}

impl From<zip::result::ZipError> for WorkerError {
    fn from(err: zip::result::ZipError) -> Self {
        WorkerError::Transient(format!("zip error: {err}"))
    }
}

impl From<image::ImageError> for WorkerError {
    fn from(err: image::ImageError) -> Self {
        WorkerError::User(format!("unreadable image: {err}"))
    }
}

impl From<pdf_oxide::Error> for WorkerError {
    fn from(err: pdf_oxide::Error) -> Self {
        classify_pdf_oxide_error(&err)
    }
}

/// `pdf_oxide` surfaces malformed-document and password-protection failures
/// through the same error type as internal I/O failures. Malformed/encrypted
/// input is the caller's fault; anything else is ours to retry.
fn classify_pdf_oxide_error(err: &pdf_oxide::Error) -> WorkerError {
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("password")
        || lower.contains("encrypt")
        || lower.contains("malformed")
        || lower.contains("corrupt")
        || lower.contains("invalid pdf")
        || lower.contains("unsupported")
    {
        WorkerError::User(msg)
    } else {
        WorkerError::Transient(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_error_reports_user_input_invalid() {
        let err = WorkerError::user("bad page range");
        assert_eq!(err.code(), USER_INPUT_INVALID);
    }

    #[test]
    fn transient_error_reports_service_capacity_temporary() {
        let err = WorkerError::transient("qpdf timed out");
        assert_eq!(err.code(), SERVICE_CAPACITY_TEMPORARY);
    }
}

//! zenpdf-worker: a queue-driven PDF processing worker.
//!
//! The binary entrypoint (`main.rs`) wires these modules together; the
//! modules themselves are exposed as a library so integration tests can
//! exercise them directly.

pub mod blob;
pub mod compression;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod naming;
pub mod ops;
pub mod page_range;
pub mod pdf;
pub mod queue;
pub mod scratch;
pub mod tool_runner;
pub mod web_fetch;
pub mod worker;

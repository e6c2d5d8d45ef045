//! Mechanical tool operations (§4.7's per-tool table, supplemented per
//! SPEC_FULL.md §4.7): one module per `JobTool`, each built directly on the
//! `pdf` adapter (C15), the page-range parser (C5), and the external tool
//! runner (C4).

mod compare;
mod compress;
mod crop;
mod image_to_pdf;
mod office_to_pdf;
mod ocr_convert;
mod pdf_to_jpg;
mod pdf_to_text;
mod pdfa;
mod protect_unlock;
mod redact_highlight;
mod repair;
mod rotate;
mod merge_split;
mod reorder_remove;
mod watermark_numbers;
mod web_to_pdf;
mod zip_util;

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::compression::CompressionConfig;
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::scratch::ScratchDir;
use crate::web_fetch::SafeWebFetcher;

/// Everything a tool operation needs, assembled once per job by the
/// dispatcher before routing to a specific `ops::*::run`.
pub struct ToolContext<'a> {
    pub scratch: &'a ScratchDir,
    pub inputs: &'a [PathBuf],
    pub input_names: &'a [String],
    pub config: &'a Map<String, Value>,
    pub compression_config: &'a CompressionConfig,
    pub worker_config: &'a WorkerConfig,
    pub web_fetcher: &'a SafeWebFetcher,
}

impl<'a> ToolContext<'a> {
    pub fn first_input(&self) -> WorkerResult<&PathBuf> {
        self.inputs
            .first()
            .ok_or_else(|| WorkerError::user("this tool requires at least one input file"))
    }

    pub fn first_input_name(&self) -> &str {
        self.input_names.first().map(String::as_str).unwrap_or("output.pdf")
    }

    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.scratch.path().join(filename)
    }

    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config.get(key).and_then(Value::as_str)
    }

    pub fn config_i64(&self, key: &str) -> Option<i64> {
        self.config.get(key).and_then(|v| v.as_i64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
    }

    pub fn config_str_required(&self, key: &str) -> WorkerResult<&str> {
        match self.config_str(key) {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(WorkerError::user(format!("missing required config field '{key}'"))),
        }
    }
}

pub use compare::run as run_compare;
pub use compress::run as run_compress;
pub use crop::run as run_crop;
pub use image_to_pdf::run as run_image_to_pdf;
pub use merge_split::{run_merge, run_split};
pub use ocr_convert::{run_pdf_to_excel, run_pdf_to_excel_ocr, run_pdf_to_word, run_pdf_to_word_ocr};
pub use office_to_pdf::run as run_office_to_pdf;
pub use pdf_to_jpg::run as run_pdf_to_jpg;
pub use pdf_to_text::run as run_pdf_to_text;
pub use pdfa::run as run_pdfa;
pub use protect_unlock::{run_protect, run_unlock};
pub use redact_highlight::{run_highlight, run_redact};
pub use reorder_remove::{run_remove_pages, run_reorder_pages};
pub use repair::run as run_repair;
pub use rotate::run as run_rotate;
pub use watermark_numbers::{run_page_numbers, run_watermark};
pub use web_to_pdf::run as run_web_to_pdf;

//! Core data types shared across the worker: job descriptors, candidates,
//! step records, and worker identity.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The PDF tool a job asks the worker to run.
///
/// Wire representation is kebab-case to match the queue's job descriptor
/// (`"remove-pages"`, `"pdf-to-word-ocr"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobTool {
    Merge,
    Split,
    Compress,
    Repair,
    Rotate,
    RemovePages,
    ReorderPages,
    Watermark,
    PageNumbers,
    Crop,
    Redact,
    Highlight,
    Compare,
    Unlock,
    Protect,
    ImageToPdf,
    PdfToJpg,
    WebToPdf,
    OfficeToPdf,
    Pdfa,
    PdfToWord,
    PdfToWordOcr,
    PdfToText,
    PdfToExcel,
    PdfToExcelOcr,
}

impl JobTool {
    /// The kebab-case wire name, used in log fields and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            JobTool::Merge => "merge",
            JobTool::Split => "split",
            JobTool::Compress => "compress",
            JobTool::Repair => "repair",
            JobTool::Rotate => "rotate",
            JobTool::RemovePages => "remove-pages",
            JobTool::ReorderPages => "reorder-pages",
            JobTool::Watermark => "watermark",
            JobTool::PageNumbers => "page-numbers",
            JobTool::Crop => "crop",
            JobTool::Redact => "redact",
            JobTool::Highlight => "highlight",
            JobTool::Compare => "compare",
            JobTool::Unlock => "unlock",
            JobTool::Protect => "protect",
            JobTool::ImageToPdf => "image-to-pdf",
            JobTool::PdfToJpg => "pdf-to-jpg",
            JobTool::WebToPdf => "web-to-pdf",
            JobTool::OfficeToPdf => "office-to-pdf",
            JobTool::Pdfa => "pdfa",
            JobTool::PdfToWord => "pdf-to-word",
            JobTool::PdfToWordOcr => "pdf-to-word-ocr",
            JobTool::PdfToText => "pdf-to-text",
            JobTool::PdfToExcel => "pdf-to-excel",
            JobTool::PdfToExcelOcr => "pdf-to-excel-ocr",
        }
    }
}

impl fmt::Display for JobTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "merge" => JobTool::Merge,
            "split" => JobTool::Split,
            "compress" => JobTool::Compress,
            "repair" => JobTool::Repair,
            "rotate" => JobTool::Rotate,
            "remove-pages" => JobTool::RemovePages,
            "reorder-pages" => JobTool::ReorderPages,
            "watermark" => JobTool::Watermark,
            "page-numbers" => JobTool::PageNumbers,
            "crop" => JobTool::Crop,
            "redact" => JobTool::Redact,
            "highlight" => JobTool::Highlight,
            "compare" => JobTool::Compare,
            "unlock" => JobTool::Unlock,
            "protect" => JobTool::Protect,
            "image-to-pdf" => JobTool::ImageToPdf,
            "pdf-to-jpg" => JobTool::PdfToJpg,
            "web-to-pdf" => JobTool::WebToPdf,
            "office-to-pdf" => JobTool::OfficeToPdf,
            "pdfa" => JobTool::Pdfa,
            "pdf-to-word" => JobTool::PdfToWord,
            "pdf-to-word-ocr" => JobTool::PdfToWordOcr,
            "pdf-to-text" => JobTool::PdfToText,
            "pdf-to-excel" => JobTool::PdfToExcel,
            "pdf-to-excel-ocr" => JobTool::PdfToExcelOcr,
            other => return Err(format!("unsupported tool: {other}")),
        })
    }
}

/// A single input reference as it appears in a claimed job descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct InputRef {
    #[serde(rename = "storageId")]
    pub storage_id: String,
    pub filename: String,
    #[serde(rename = "sizeBytes", default)]
    pub size_bytes: u64,
}

/// Output to report back to the queue after a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRef {
    #[serde(rename = "storageId")]
    pub storage_id: String,
    pub filename: String,
    #[serde(rename = "sizeBytes")]
    pub size_bytes: u64,
}

/// A leased job descriptor, as returned by `jobs:claimNextJob`.
#[derive(Debug, Clone, Deserialize)]
pub struct JobDescriptor {
    #[serde(rename = "_id")]
    pub id: String,
    pub tool: JobTool,
    pub inputs: Vec<InputRef>,
    #[serde(default)]
    pub config: serde_json::Value,
}

impl JobDescriptor {
    /// The job's config as an object map, defaulting to empty when the
    /// queue sent `null` or omitted the field entirely.
    pub fn config_object(&self) -> serde_json::Map<String, serde_json::Value> {
        self.config.as_object().cloned().unwrap_or_default()
    }
}

/// The pipeline stage label that produced a compression candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateMethod {
    Original,
    Mutool,
    Qpdf,
    Pypdf,
    QpdfOptimizeImages,
    Pdfsizeopt,
    PdfsizeoptJbig2,
    Ghostscript,
    QpdfAfterGs,
    Passthrough,
}

impl CandidateMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateMethod::Original => "original",
            CandidateMethod::Mutool => "mutool",
            CandidateMethod::Qpdf => "qpdf",
            CandidateMethod::Pypdf => "pypdf",
            CandidateMethod::QpdfOptimizeImages => "qpdf_optimize_images",
            CandidateMethod::Pdfsizeopt => "pdfsizeopt",
            CandidateMethod::PdfsizeoptJbig2 => "pdfsizeopt_jbig2",
            CandidateMethod::Ghostscript => "ghostscript",
            CandidateMethod::QpdfAfterGs => "qpdf_after_gs",
            CandidateMethod::Passthrough => "passthrough",
        }
    }
}

/// An intermediate PDF produced by a compression pipeline stage, validated
/// before it enters the selection set.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    pub method: CandidateMethod,
    pub label: String,
    pub size: u64,
}

/// A single step's outcome, appended to the pipeline's report. `notes` is
/// truncated to 300 characters (see DESIGN.md's Open Question resolution).
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub name: String,
    pub ok: bool,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

const STEP_NOTES_MAX_LEN: usize = 300;

impl StepRecord {
    pub fn new(name: impl Into<String>, ok: bool, elapsed_ms: u64) -> Self {
        Self {
            name: name.into(),
            ok,
            elapsed_ms,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let mut notes = notes.into();
        if notes.len() > STEP_NOTES_MAX_LEN {
            // `stderr` text is frequently non-ASCII (localized tool
            // messages, unicode paths); truncate at the last char
            // boundary at or before the byte cap instead of slicing
            // blindly, which would panic on a mid-character split.
            let cut = notes
                .char_indices()
                .map(|(i, _)| i)
                .take_while(|&i| i <= STEP_NOTES_MAX_LEN)
                .last()
                .unwrap_or(0);
            notes.truncate(cut);
        }
        self.notes = Some(notes);
        self
    }
}

/// `{workerId, workerToken}` sent on every RPC.
#[derive(Debug, Clone)]
pub struct WorkerIdentity {
    pub worker_id: String,
    pub worker_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_round_trips_through_wire_strings() {
        for tool in [
            JobTool::Merge,
            JobTool::RemovePages,
            JobTool::PdfToWordOcr,
            JobTool::PdfToExcelOcr,
        ] {
            let parsed: JobTool = tool.as_str().parse().unwrap();
            assert_eq!(parsed, tool);
        }
    }

    #[test]
    fn unsupported_tool_name_is_rejected() {
        assert!("frobnicate".parse::<JobTool>().is_err());
    }

    #[test]
    fn step_notes_are_truncated() {
        let step = StepRecord::new("gs", false, 10).with_notes("a".repeat(400));
        assert_eq!(step.notes.unwrap().len(), STEP_NOTES_MAX_LEN);
    }
}

//! PDF/A conversion (§4.7): Ghostscript `-dPDFA=2`, requiring gs ≥ 10.3.1
//! and rejecting encrypted input without ever invoking Ghostscript.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{WorkerError, WorkerResult};
use crate::models::JobTool;
use crate::naming;
use crate::pdf::PdfHandle;
use crate::tool_runner::{binary_available, run_bounded};

use super::ToolContext;

const MIN_GS_MAJOR: u32 = 10;
const MIN_GS_MINOR: u32 = 3;
const MIN_GS_PATCH: u32 = 1;
const PDFA_TIMEOUT: Duration = Duration::from_secs(300);

pub async fn run(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    if PdfHandle::open(input)?.is_encrypted() {
        return Err(WorkerError::user("Cannot convert an encrypted PDF to PDF/A"));
    }

    if !binary_available("gs") {
        return Err(WorkerError::transient("Ghostscript (gs) is not installed on this worker"));
    }
    check_gs_version().await?;

    let output = ctx.output_path(&naming::output_filename(JobTool::Pdfa, ctx.first_input_name()));
    let input_str = input.to_string_lossy().into_owned();
    let output_flag = format!("-sOutputFile={}", output.to_string_lossy());
    let args = [
        "-dPDFA=2",
        "-dBATCH",
        "-dNOPAUSE",
        "-dQUIET",
        "-sColorConversionStrategy=UseDeviceIndependentColor",
        "-sDEVICE=pdfwrite",
        "-dPDFACompatibilityPolicy=1",
        output_flag.as_str(),
        input_str.as_str(),
    ];

    let outcome = run_bounded("gs", &args, None, &Default::default(), PDFA_TIMEOUT).await;
    if !outcome.ok {
        return Err(WorkerError::transient(format!(
            "PDF/A conversion failed: {}",
            outcome.stderr
        )));
    }
    Ok(vec![output])
}

async fn check_gs_version() -> WorkerResult<()> {
    let outcome = run_bounded("gs", &["--version"], None, &Default::default(), Duration::from_secs(10)).await;
    if !outcome.ok {
        return Err(WorkerError::transient("could not determine Ghostscript version"));
    }
    let version = outcome.stdout.trim();
    let parts: Vec<u32> = version.split('.').filter_map(|p| p.parse().ok()).collect();
    let (major, minor, patch) = (
        parts.first().copied().unwrap_or(0),
        parts.get(1).copied().unwrap_or(0),
        parts.get(2).copied().unwrap_or(0),
    );
    let meets_minimum = (major, minor, patch) >= (MIN_GS_MAJOR, MIN_GS_MINOR, MIN_GS_PATCH);
    if !meets_minimum {
        return Err(WorkerError::user(format!(
            "Ghostscript {version} is older than the required 10.3.1 for PDF/A conversion"
        )));
    }
    Ok(())
}

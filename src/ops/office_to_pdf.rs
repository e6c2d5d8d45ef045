//! Office-to-PDF (§4.7): shells out to LibreOffice headless conversion.
//! Requires `soffice` on `PATH`; its absence is an environment/transient
//! error rather than a user error (spec.md §7).

use std::time::Duration;

use std::path::PathBuf;

use crate::error::{WorkerError, WorkerResult};
use crate::tool_runner::{binary_available, run_bounded};

use super::ToolContext;

const CONVERT_TIMEOUT: Duration = Duration::from_secs(180);

/// Extensions LibreOffice headless can import for `--convert-to pdf`.
/// Anything else is a user error (spec.md §7), not a `soffice` failure.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "doc", "docx", "dot", "dotx", "odt", "ott", "rtf", "txt", "xls", "xlsx", "xlt", "xltx", "ods",
    "ots", "csv", "ppt", "pptx", "pot", "potx", "odp", "otp",
];

pub async fn run(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;

    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| WorkerError::user("office-to-pdf input has no file extension"))?;
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(WorkerError::user(format!(
            "unsupported office extension: .{extension}"
        )));
    }

    if !binary_available("soffice") {
        return Err(WorkerError::transient(
            "soffice (LibreOffice) is not installed on this worker",
        ));
    }

    let outdir = ctx.scratch.path().to_string_lossy().into_owned();
    let input_str = input.to_string_lossy().into_owned();
    let args = [
        "--headless",
        "--convert-to",
        "pdf",
        "--outdir",
        outdir.as_str(),
        input_str.as_str(),
    ];

    let outcome = run_bounded("soffice", &args, None, &Default::default(), CONVERT_TIMEOUT).await;
    if !outcome.ok {
        return Err(WorkerError::transient(format!(
            "office-to-pdf conversion failed: {}",
            outcome.stderr
        )));
    }

    let converted = input.with_extension("pdf");
    let converted = ctx.scratch.path().join(
        converted
            .file_name()
            .ok_or_else(|| WorkerError::transient("converted output has no filename"))?,
    );
    if !converted.exists() {
        return Err(WorkerError::transient(
            "soffice reported success but produced no output file",
        ));
    }

    let final_output = ctx.output_path(&crate::naming::output_filename(
        crate::models::JobTool::OfficeToPdf,
        ctx.first_input_name(),
    ));
    if converted != final_output {
        std::fs::rename(&converted, &final_output)
            .map_err(|e| WorkerError::transient(format!("cannot place converted output: {e}")))?;
    }
    Ok(vec![final_output])
}

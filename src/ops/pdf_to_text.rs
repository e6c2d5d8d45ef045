//! PDF-to-text (§4.7): plain UTF-8 text extraction, one page's text per
//! line break, via the `pdf` adapter's span extraction.

use std::fs;
use std::path::PathBuf;

use crate::error::WorkerResult;
use crate::models::JobTool;
use crate::naming;
use crate::pdf::PdfHandle;

use super::ToolContext;

pub fn run(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    let handle = PdfHandle::open(input)?;
    let text = handle.extract_all_text()?;

    let output = ctx.output_path(&naming::output_filename(JobTool::PdfToText, ctx.first_input_name()));
    fs::write(&output, text)?;
    Ok(vec![output])
}

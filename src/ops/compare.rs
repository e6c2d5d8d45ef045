//! Compare (§4.7/§8 scenario 8): a per-page text diff report between two
//! PDFs, written as UTF-8 text starting with the fixed header spec.md §6
//! names.

use std::fs;
use std::path::PathBuf;

use crate::error::{WorkerError, WorkerResult};
use crate::models::JobTool;
use crate::naming;
use crate::pdf::PdfHandle;

use super::ToolContext;

pub fn run(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    if ctx.inputs.len() < 2 {
        return Err(WorkerError::user("compare requires exactly two input files"));
    }
    let path_a = &ctx.inputs[0];
    let path_b = &ctx.inputs[1];
    let name_a = ctx.input_names.first().map(String::as_str).unwrap_or("A");
    let name_b = ctx.input_names.get(1).map(String::as_str).unwrap_or("B");

    let handle_a = PdfHandle::open(path_a)?;
    let handle_b = PdfHandle::open(path_b)?;
    let pages_a = handle_a.page_count();
    let pages_b = handle_b.page_count();

    let mut report = String::new();
    report.push_str("ZenPDF comparison report\n");
    report.push_str(&format!("File A: {name_a}\n"));
    report.push_str(&format!("File B: {name_b}\n"));
    report.push_str(&format!("Pages: {pages_a} vs {pages_b}\n"));

    let max_pages = pages_a.max(pages_b);
    let mut any_difference = false;
    for page in 0..max_pages {
        let text_a = if page < pages_a { handle_a.extract_text(page)? } else { String::new() };
        let text_b = if page < pages_b { handle_b.extract_text(page)? } else { String::new() };
        if text_a != text_b {
            any_difference = true;
            report.push_str(&format!("page {}: text differs\n", page + 1));
        }
    }
    if !any_difference {
        report.push_str("No text differences detected.\n");
    }

    let output = ctx.output_path(&naming::output_filename(JobTool::Compare, ctx.first_input_name()));
    fs::write(&output, report)?;
    Ok(vec![output])
}

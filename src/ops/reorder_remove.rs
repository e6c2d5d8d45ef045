//! Remove-pages and reorder-pages (§4.7): an empty selection is an
//! identity merge of the single input, matching the original's
//! `if not pages.strip(): return merge_pdfs([input], output)` shortcut.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::WorkerResult;
use crate::models::JobTool;
use crate::naming;
use crate::page_range::parse_page_ranges;
use crate::pdf::{self, PdfHandle};

use super::ToolContext;

pub fn run_remove_pages(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    let output = ctx.output_path(&naming::output_filename(JobTool::RemovePages, ctx.first_input_name()));

    let raw = ctx.config_str("pages").unwrap_or("");
    if raw.trim().is_empty() {
        pdf::merge(std::slice::from_ref(input), &output)?;
        return Ok(vec![output]);
    }

    let total = PdfHandle::open(input)?.page_count();
    let remove: HashSet<usize> = parse_page_ranges(raw, total).into_iter().collect();
    pdf::remove_pages(input, &output, &remove)?;
    Ok(vec![output])
}

pub fn run_reorder_pages(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    let output = ctx.output_path(&naming::output_filename(JobTool::ReorderPages, ctx.first_input_name()));

    let raw = ctx.config_str("order").unwrap_or("");
    if raw.trim().is_empty() {
        pdf::merge(std::slice::from_ref(input), &output)?;
        return Ok(vec![output]);
    }

    let total = PdfHandle::open(input)?.page_count();
    let order = parse_page_ranges(raw, total);
    let order = if order.is_empty() { (1..=total).collect() } else { order };
    pdf::reorder_pages(input, &output, &order)?;
    Ok(vec![output])
}

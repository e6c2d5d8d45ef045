//! Watermark and page-numbers (§4.7): both are a text overlay drawn via
//! the same `pdf::draw_text_overlay` primitive, differing only in anchor
//! and per-page text.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::WorkerResult;
use crate::models::JobTool;
use crate::naming;
use crate::page_range::parse_page_ranges;
use crate::pdf::{self, PdfHandle, TextAnchor};

use super::ToolContext;

pub fn run_watermark(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    let text = ctx.config_str_required("text")?.to_string();

    let pages = resolve_pages(ctx, input)?;
    let output = ctx.output_path(&naming::output_filename(JobTool::Watermark, ctx.first_input_name()));
    pdf::draw_text_overlay(input, &output, pages.as_ref(), |_| text.clone(), TextAnchor::Center)?;
    Ok(vec![output])
}

pub fn run_page_numbers(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    let start = ctx.config_i64("start").unwrap_or(1);

    let pages = resolve_pages(ctx, input)?;
    let output = ctx.output_path(&naming::output_filename(JobTool::PageNumbers, ctx.first_input_name()));
    pdf::draw_text_overlay(
        input,
        &output,
        pages.as_ref(),
        move |page_index| (start + page_index as i64 - 1).to_string(),
        TextAnchor::FooterRight,
    )?;
    Ok(vec![output])
}

fn resolve_pages(ctx: &ToolContext<'_>, input: &std::path::Path) -> WorkerResult<Option<HashSet<usize>>> {
    match ctx.config_str("pages") {
        Some(raw) if !raw.trim().is_empty() => {
            let total = PdfHandle::open(input)?.page_count();
            Ok(Some(parse_page_ranges(raw, total).into_iter().collect()))
        }
        _ => Ok(None),
    }
}

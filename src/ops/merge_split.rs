//! Merge and split (§4.7): merge concatenates every input in order; split
//! slices one input into the requested ranges (or one PDF per page when no
//! `ranges` config is given) and zips the result.

use std::path::PathBuf;

use crate::error::{WorkerError, WorkerResult};
use crate::models::JobTool;
use crate::naming;
use crate::pdf::{self, PdfHandle};

use super::{zip_util, ToolContext};

/// `merge([P])` is an identity copy at the page-content level (spec.md §8
/// scenario 1's single-input case, and the `remove-pages`/`reorder-pages`
/// empty-selection fallback).
pub fn run_merge(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let output = ctx.output_path(&naming::output_filename(JobTool::Merge, ctx.first_input_name()));
    pdf::merge(ctx.inputs, &output)?;
    Ok(vec![output])
}

pub fn run_split(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    let handle = PdfHandle::open(input)?;
    let total_pages = handle.page_count();
    drop(handle);

    let ranges: Vec<(usize, usize)> = match ctx.config_str("ranges") {
        Some(raw) if !raw.trim().is_empty() => {
            let spans = parse_ranges_to_spans(raw, total_pages);
            if spans.is_empty() {
                return Err(WorkerError::user("No valid page ranges provided"));
            }
            spans
        }
        _ => (1..=total_pages).map(|p| (p, p)).collect(),
    };

    let mut parts = Vec::with_capacity(ranges.len());
    for (index, (start, end)) in ranges.iter().enumerate() {
        let part_path = ctx.scratch.path().join(format!("split_{}.pdf", index + 1));
        pdf::extract_range(input, &part_path, *start, *end)?;
        parts.push(part_path);
    }

    let zip_path = ctx.output_path(&naming::output_filename(JobTool::Split, ctx.first_input_name()));
    zip_util::zip_files(&parts, &zip_path)?;
    Ok(vec![zip_path])
}

/// Reuses [`parse_page_ranges`]'s tolerant token parsing but keeps the
/// `(start, end)` spans intact rather than expanding to a flat page list,
/// since split needs one output file per contiguous range.
fn parse_ranges_to_spans(input: &str, total_pages: usize) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    for token in input.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if let Some((a, b)) = token.split_once('-') {
            let (Ok(a), Ok(b)) = (a.trim().parse::<i64>(), b.trim().parse::<i64>()) else {
                continue;
            };
            let start = a.max(1) as usize;
            let end = (b as usize).min(total_pages);
            if start <= end {
                spans.push((start, end));
            }
        } else if let Ok(n) = token.parse::<i64>() {
            let n = n.max(1) as usize;
            if n <= total_pages {
                spans.push((n, n));
            }
        }
    }
    spans
}

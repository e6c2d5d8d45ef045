//! Redact and highlight (§4.7): exact-match text search, then an opaque
//! (redact) or translucent (highlight) box drawn over every hit.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::WorkerResult;
use crate::models::JobTool;
use crate::naming;
use crate::page_range::parse_page_ranges;
use crate::pdf::{self, PdfHandle};

use super::ToolContext;

pub fn run_redact(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    run_mark(ctx, JobTool::Redact, true)
}

pub fn run_highlight(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    run_mark(ctx, JobTool::Highlight, false)
}

fn run_mark(ctx: &ToolContext<'_>, tool: JobTool, opaque: bool) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    let text = ctx.config_str_required("text")?;

    let restricted_pages = match ctx.config_str("pages") {
        Some(raw) if !raw.trim().is_empty() => {
            let total = PdfHandle::open(input)?.page_count();
            Some(parse_page_ranges(raw, total).into_iter().collect::<HashSet<_>>())
        }
        _ => None,
    };

    let hits = pdf::find_text(input, text)?;
    let hits: Vec<_> = hits
        .into_iter()
        .filter(|(page, _)| {
            restricted_pages
                .as_ref()
                .map(|set| set.contains(&(page + 1)))
                .unwrap_or(true)
        })
        .collect();

    let output = ctx.output_path(&naming::output_filename(tool, ctx.first_input_name()));
    pdf::mark_text_hits(input, &output, &hits, opaque)?;
    Ok(vec![output])
}

//! Rotate (§4.7): `angle` defaults to 90 and is clamped to the three
//! supported values, matching the original's `angle not in (90,180,270) ->
//! 90` fallback rather than rejecting the job.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::WorkerResult;
use crate::models::JobTool;
use crate::naming;
use crate::page_range::parse_page_ranges;
use crate::pdf::{self, PdfHandle};

use super::ToolContext;

pub fn run(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    let mut angle = ctx.config_i64("angle").unwrap_or(90) as i32;
    if !matches!(angle, 90 | 180 | 270) {
        angle = 90;
    }

    let pages = match ctx.config_str("pages") {
        Some(raw) if !raw.trim().is_empty() => {
            let total = PdfHandle::open(input)?.page_count();
            Some(parse_page_ranges(raw, total).into_iter().collect::<HashSet<_>>())
        }
        _ => None,
    };

    let output = ctx.output_path(&naming::output_filename(JobTool::Rotate, ctx.first_input_name()));
    pdf::rotate(input, &output, angle, pages.as_ref())?;
    Ok(vec![output])
}

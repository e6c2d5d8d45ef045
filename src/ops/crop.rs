//! Crop (§4.7): `margins` is required (1 or 4 non-negative values); fails
//! if the crop would remove a targeted page's content entirely.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::{WorkerError, WorkerResult};
use crate::models::JobTool;
use crate::naming;
use crate::page_range::{parse_margins, parse_page_ranges};
use crate::pdf::{self, PdfHandle};

use super::ToolContext;

pub fn run(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    let margins = parse_margins(ctx.config_str_required("margins")?)?;
    if margins.top < 0.0 || margins.right < 0.0 || margins.bottom < 0.0 || margins.left < 0.0 {
        return Err(WorkerError::user("margins must be non-negative"));
    }

    let pages = match ctx.config_str("pages") {
        Some(raw) if !raw.trim().is_empty() => {
            let total = PdfHandle::open(input)?.page_count();
            Some(parse_page_ranges(raw, total).into_iter().collect::<HashSet<_>>())
        }
        _ => None,
    };

    let output = ctx.output_path(&naming::output_filename(JobTool::Crop, ctx.first_input_name()));
    pdf::crop(input, &output, margins, pages.as_ref())?;
    Ok(vec![output])
}

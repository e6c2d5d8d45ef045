//! PDF-to-JPG (§4.7): rasterizes every page at `dpi` (clamped to
//! `[72, 300]`, default 150) and zips the results.

use std::path::PathBuf;

use crate::error::WorkerResult;
use crate::models::JobTool;
use crate::naming;
use crate::pdf;

use super::{zip_util, ToolContext};

pub fn run(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    let dpi = ctx.config_i64("dpi").unwrap_or(150).clamp(72, 300) as u32;

    let pages = pdf::render_pages_to_jpg(input, ctx.scratch.path(), dpi)?;

    let zip_path = ctx.output_path(&naming::output_filename(JobTool::PdfToJpg, ctx.first_input_name()));
    zip_util::zip_files(&pages, &zip_path)?;
    Ok(vec![zip_path])
}

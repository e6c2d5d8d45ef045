//! Image-to-PDF (§4.7): embeds every input image as a full-bleed page, in
//! input order — the `img2pdf`-equivalent of the original.

use std::path::PathBuf;

use crate::error::WorkerResult;
use crate::models::JobTool;
use crate::naming;
use crate::pdf;

use super::ToolContext;

pub fn run(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let output = ctx.output_path(&naming::output_filename(JobTool::ImageToPdf, ctx.first_input_name()));
    pdf::images_to_pdf(ctx.inputs, &output)?;
    Ok(vec![output])
}

//! Repair (§4.7): re-emits the document carrying metadata forward,
//! rejecting encrypted input — the mechanical counterpart to the
//! compression pipeline's library-rewrite fallback.

use std::path::PathBuf;

use crate::error::{WorkerError, WorkerResult};
use crate::models::JobTool;
use crate::naming;
use crate::pdf::{self, PdfHandle};

use super::ToolContext;

pub fn run(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    let handle = PdfHandle::open(input)?;
    if handle.is_encrypted() {
        return Err(WorkerError::user("Cannot repair an encrypted PDF"));
    }
    drop(handle);

    let output = ctx.output_path(&naming::output_filename(JobTool::Repair, ctx.first_input_name()));
    pdf::rewrite_compressed(input, &output)?;
    Ok(vec![output])
}

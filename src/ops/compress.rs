//! Compress (§4.6/§4.7): thin wrapper handing off to the staged
//! compression pipeline, logging its full report at `info` level.

use std::path::PathBuf;

use tracing::info;

use crate::compression;
use crate::error::WorkerResult;
use crate::models::JobTool;
use crate::naming;

use super::ToolContext;

pub async fn run(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    let output = ctx.output_path(&naming::output_filename(JobTool::Compress, ctx.first_input_name()));

    let report = compression::compress_pdf(input, &output, ctx.scratch, ctx.compression_config).await?;
    info!(
        status = report.status,
        method = report.method,
        original_bytes = report.original_bytes,
        output_bytes = report.output_bytes,
        savings_percent = report.savings_percent,
        "compress job finished"
    );
    Ok(vec![output])
}

//! Protect and unlock (§4.7): password-gated encryption/decryption.
//! `pdf::encrypt`/`pdf::decrypt` already carry the user-error cases
//! (already encrypted, wrong password).

use std::path::PathBuf;

use crate::error::WorkerResult;
use crate::models::JobTool;
use crate::naming;
use crate::pdf;

use super::ToolContext;

pub fn run_protect(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    let password = ctx.config_str_required("password")?;
    let output = ctx.output_path(&naming::output_filename(JobTool::Protect, ctx.first_input_name()));
    pdf::encrypt(input, &output, password)?;
    Ok(vec![output])
}

pub fn run_unlock(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    let password = ctx.config_str_required("password")?;
    let output = ctx.output_path(&naming::output_filename(JobTool::Unlock, ctx.first_input_name()));
    pdf::decrypt(input, &output, password)?;
    Ok(vec![output])
}

//! PDF-to-Word / PDF-to-Excel, with and without OCR (§4.7): routed through
//! LibreOffice headless conversion; the `-ocr` variants first burn a
//! Tesseract text layer onto a rendered copy of the document so that
//! LibreOffice's import has extractable text to work with.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{WorkerError, WorkerResult};
use crate::models::JobTool;
use crate::naming;
use crate::pdf;
use crate::tool_runner::{binary_available, run_bounded};

use super::ToolContext;

const OCR_TIMEOUT: Duration = Duration::from_secs(120);
const CONVERT_TIMEOUT: Duration = Duration::from_secs(180);
const OCR_DPI: u32 = 200;

pub async fn run_pdf_to_word(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    convert(ctx, JobTool::PdfToWord, "docx", "MS Word 2007 XML", false).await
}

pub async fn run_pdf_to_word_ocr(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    convert(ctx, JobTool::PdfToWordOcr, "docx", "MS Word 2007 XML", true).await
}

pub async fn run_pdf_to_excel(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    convert(ctx, JobTool::PdfToExcel, "xlsx", "Calc MS Excel 2007 XML", false).await
}

pub async fn run_pdf_to_excel_ocr(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    convert(ctx, JobTool::PdfToExcelOcr, "xlsx", "Calc MS Excel 2007 XML", true).await
}

async fn convert(
    ctx: &ToolContext<'_>,
    tool: JobTool,
    extension: &str,
    filter_name: &str,
    use_ocr: bool,
) -> WorkerResult<Vec<PathBuf>> {
    let input = ctx.first_input()?;
    if !binary_available("soffice") {
        return Err(WorkerError::transient(
            "soffice (LibreOffice) is not installed on this worker",
        ));
    }

    let source = if use_ocr {
        burn_ocr_text_layer(input, ctx).await?
    } else {
        input.clone()
    };

    let outdir = ctx.scratch.path().to_string_lossy().into_owned();
    let source_str = source.to_string_lossy().into_owned();
    let convert_to = format!("{extension}:{filter_name}");
    let args = [
        "--headless",
        "--convert-to",
        convert_to.as_str(),
        "--outdir",
        outdir.as_str(),
        source_str.as_str(),
    ];

    let outcome = run_bounded("soffice", &args, None, &Default::default(), CONVERT_TIMEOUT).await;
    if !outcome.ok {
        return Err(WorkerError::transient(format!(
            "{tool} conversion failed: {}",
            outcome.stderr
        )));
    }

    let produced = ctx.scratch.path().join(
        source
            .with_extension(extension)
            .file_name()
            .ok_or_else(|| WorkerError::transient("converted output has no filename"))?,
    );
    if !produced.exists() {
        return Err(WorkerError::transient(format!(
            "soffice reported success but produced no {extension} output"
        )));
    }

    let final_output = ctx.output_path(&naming::output_filename(tool, ctx.first_input_name()));
    if produced != final_output {
        std::fs::rename(&produced, &final_output)
            .map_err(|e| WorkerError::transient(format!("cannot place converted output: {e}")))?;
    }
    Ok(vec![final_output])
}

/// Renders every page to an image, runs Tesseract in `pdf` output mode on
/// each to produce a searchable single-page PDF, then merges the pages
/// back into one document — the text layer LibreOffice's importer reads.
async fn burn_ocr_text_layer(input: &Path, ctx: &ToolContext<'_>) -> WorkerResult<PathBuf> {
    if !binary_available("tesseract") {
        return Err(WorkerError::transient(
            "tesseract is not installed on this worker",
        ));
    }

    let pages = pdf::render_pages_to_jpg(input, ctx.scratch.path(), OCR_DPI)?;
    let lang = &ctx.worker_config.ocr_lang;
    let mut page_pdfs = Vec::with_capacity(pages.len());

    for page_image in &pages {
        let out_base = page_image.with_extension("");
        let image_str = page_image.to_string_lossy().into_owned();
        let base_str = out_base.to_string_lossy().into_owned();
        let args = [image_str.as_str(), base_str.as_str(), "-l", lang.as_str(), "pdf"];
        let outcome = run_bounded("tesseract", &args, None, &Default::default(), OCR_TIMEOUT).await;
        if !outcome.ok {
            return Err(WorkerError::transient(format!(
                "tesseract OCR failed on {}: {}",
                page_image.display(),
                outcome.stderr
            )));
        }
        page_pdfs.push(out_base.with_extension("pdf"));
    }

    let merged = ctx.scratch.intermediate_path("ocr", "merged");
    pdf::merge(&page_pdfs, &merged)?;
    Ok(merged)
}

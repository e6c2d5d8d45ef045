//! Output Naming (C9): derives `{stem}_{suffix}.{ext}` from the first job
//! input and the tool being run.

use std::path::Path;

use crate::models::JobTool;

/// Strips the `NN_` scratch-download prefix (digits up to the first `_`)
/// that [`crate::scratch::ScratchDir::input_path`] adds, and the file
/// extension, leaving the logical stem a human named the upload with.
pub fn logical_stem(input_filename: &str) -> String {
    let name = Path::new(input_filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input_filename.to_string());

    let without_prefix = match name.split_once('_') {
        Some((digits, rest)) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
            rest.to_string()
        }
        _ => name,
    };

    match without_prefix.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem.to_string(),
        _ => without_prefix,
    }
}

/// `(suffix, extension)` for a tool's primary output. `None` extension
/// means "keep the input's extension" (defaulting to `.pdf` when there is
/// none).
fn suffix_and_ext(tool: JobTool) -> (&'static str, Option<&'static str>) {
    match tool {
        JobTool::Merge => ("merged", None),
        JobTool::Split => ("split", Some(".zip")),
        JobTool::Compress => ("compressed", None),
        JobTool::Repair => ("repaired", None),
        JobTool::Rotate => ("rotated", None),
        JobTool::RemovePages => ("pages_removed", None),
        JobTool::ReorderPages => ("reordered", None),
        JobTool::Watermark => ("watermarked", None),
        JobTool::PageNumbers => ("numbered", None),
        JobTool::Crop => ("cropped", None),
        JobTool::Redact => ("redacted", None),
        JobTool::Highlight => ("highlighted", None),
        JobTool::Compare => ("compare_report", Some(".txt")),
        JobTool::Unlock => ("unlocked", None),
        JobTool::Protect => ("protected", None),
        JobTool::ImageToPdf => ("images", Some(".pdf")),
        JobTool::PdfToJpg => ("pages", Some(".zip")),
        JobTool::WebToPdf => ("web_to_pdf", Some(".pdf")),
        JobTool::OfficeToPdf => ("converted", Some(".pdf")),
        JobTool::Pdfa => ("pdfa", None),
        JobTool::PdfToWord | JobTool::PdfToWordOcr => ("word", Some(".docx")),
        JobTool::PdfToText => ("text", Some(".txt")),
        JobTool::PdfToExcel | JobTool::PdfToExcelOcr => ("excel", Some(".xlsx")),
    }
}

/// Builds `temp/{stem}_{suffix}{ext}` for `tool` given the first job input's
/// original filename. `web-to-pdf` has no real input file, so it always
/// names its output `temp/web_to_pdf.pdf` regardless of `first_input_name`.
pub fn output_filename(tool: JobTool, first_input_name: &str) -> String {
    if tool == JobTool::WebToPdf {
        return "web_to_pdf.pdf".to_string();
    }

    let (suffix, forced_ext) = suffix_and_ext(tool);
    let ext = forced_ext
        .map(str::to_string)
        .unwrap_or_else(|| extension_of(first_input_name));
    format!("{}_{suffix}{ext}", logical_stem(first_input_name))
}

fn extension_of(filename: &str) -> String {
    match Path::new(filename).extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy()),
        None => ".pdf".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_download_prefix_and_extension() {
        assert_eq!(logical_stem("03_contract.pdf"), "contract");
    }

    #[test]
    fn leaves_names_without_a_numeric_prefix_alone() {
        assert_eq!(logical_stem("contract.pdf"), "contract");
    }

    #[test]
    fn compress_keeps_source_extension() {
        assert_eq!(output_filename(JobTool::Compress, "01_report.pdf"), "report_compressed.pdf");
    }

    #[test]
    fn pdf_to_text_forces_txt_extension() {
        assert_eq!(output_filename(JobTool::PdfToText, "01_report.pdf"), "report_text.txt");
    }

    #[test]
    fn web_to_pdf_ignores_the_input_name() {
        assert_eq!(output_filename(JobTool::WebToPdf, "01_whatever.bin"), "web_to_pdf.pdf");
    }

    #[test]
    fn missing_extension_defaults_to_pdf() {
        assert_eq!(output_filename(JobTool::Rotate, "02_scan"), "scan_rotated.pdf");
    }
}

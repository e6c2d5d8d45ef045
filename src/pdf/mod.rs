//! PDF Library Adapter (C15): the single seam through which every tool
//! operation and the compression pipeline's library-rewrite fallback touch
//! PDF structure. Everything downstream of this module is `pdf_oxide`-free.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use pdf_oxide::document::PdfDocument as OxideDocument;
use pdf_oxide::editor::PdfEditor;
use pdf_oxide::writer::DocumentBuilder;

use crate::error::{WorkerError, WorkerResult};
use crate::page_range::Margins;

/// Document-level metadata we round-trip across tool operations.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
}

/// Where on a page an overlay (watermark text, page number, redaction bar)
/// should be drawn.
#[derive(Debug, Clone, Copy)]
pub enum TextAnchor {
    /// Horizontally and vertically centered, used by the watermark.
    Center,
    /// Right-aligned footer, used by page numbers.
    FooterRight,
}

/// A loaded PDF, opened once per operation and dropped after the result is
/// written back out through an editor pass or a builder.
pub struct PdfHandle {
    inner: OxideDocument,
    path: PathBuf,
}

impl PdfHandle {
    pub fn open(path: &Path) -> WorkerResult<Self> {
        let inner = OxideDocument::open(path)?;
        Ok(Self {
            inner,
            path: path.to_path_buf(),
        })
    }

    /// Opens with a user-supplied password, for the `unlock` tool.
    pub fn open_with_password(path: &Path, password: &str) -> WorkerResult<Self> {
        let inner = OxideDocument::open_encrypted(path, password)
            .map_err(|_| WorkerError::user("Incorrect password"))?;
        Ok(Self {
            inner,
            path: path.to_path_buf(),
        })
    }

    pub fn is_encrypted(&self) -> bool {
        self.inner.is_encrypted()
    }

    pub fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    pub fn metadata(&self) -> Metadata {
        let meta = self.inner.metadata();
        Metadata {
            title: meta.title.clone(),
            author: meta.author.clone(),
            subject: meta.subject.clone(),
            keywords: meta.keywords.clone(),
        }
    }

    pub fn extract_text(&self, page_index: usize) -> WorkerResult<String> {
        let spans = self.inner.extract_spans(page_index)?;
        Ok(spans.into_iter().map(|s| s.text).collect::<Vec<_>>().join(" "))
    }

    pub fn extract_all_text(&self) -> WorkerResult<String> {
        let mut out = String::new();
        for page in 0..self.page_count() {
            out.push_str(&self.extract_text(page)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Rough image-count for a page, used by the compression pipeline's
    /// image-heavy classifier (§4.6).
    pub fn image_count(&self, page_index: usize) -> WorkerResult<usize> {
        let images = self.inner.page_images(page_index)?;
        Ok(images.len())
    }

    pub fn page_size_points(&self, page_index: usize) -> WorkerResult<(f64, f64)> {
        let page = self
            .inner
            .page(page_index)
            .map_err(|e| WorkerError::transient(format!("cannot read page geometry: {e}")))?;
        Ok((page.width(), page.height()))
    }

    pub fn source_path(&self) -> &Path {
        &self.path
    }

    /// Opens an editor session for page-level mutation (removal, reorder,
    /// rotation, merge, crop, overlay drawing, metadata rewrite) against
    /// this document.
    pub fn editor(&self) -> WorkerResult<PdfEditor> {
        Ok(PdfEditor::open(&self.path)
            .map_err(|e| WorkerError::transient(format!("cannot open editor: {e}")))?)
    }

    /// A cheap validity probe for the compression pipeline's candidate
    /// validation: the document opens and its first page's content stream
    /// decodes without error.
    pub fn renders_first_page(path: &Path) -> bool {
        match OxideDocument::open(path) {
            Ok(doc) if doc.page_count() > 0 => doc.extract_spans(0).is_ok(),
            _ => false,
        }
    }
}

/// Builds a fresh PDF from scratch — used by `image-to-pdf`, `web-to-pdf`,
/// and the library-rewrite fallback in the compression pipeline's normalize
/// stage.
pub fn new_document_builder() -> DocumentBuilder {
    DocumentBuilder::new()
}

/// Merges `inputs` into a single document written at `output`, in order,
/// preserving every page. A single input is effectively an identity copy
/// (spec.md §8's merge round-trip property).
pub fn merge(inputs: &[PathBuf], output: &Path) -> WorkerResult<()> {
    let mut editor = PdfEditor::new();
    for input in inputs {
        let doc = OxideDocument::open(input)?;
        editor.append_document(&doc)?;
    }
    editor.save(output)?;
    Ok(())
}

/// Writes out the `start..=end` (1-based, inclusive) page window of `input`
/// to `output`, for `split`.
pub fn extract_range(input: &Path, output: &Path, start: usize, end: usize) -> WorkerResult<()> {
    let doc = OxideDocument::open(input)?;
    let mut editor = PdfEditor::new();
    for page in start..=end {
        editor.append_page(&doc, page - 1)?;
    }
    editor.save(output)?;
    Ok(())
}

/// Rotates `pages` (1-based; `None` means every page) by `angle` degrees
/// clockwise (one of 90/180/270).
pub fn rotate(
    input: &Path,
    output: &Path,
    angle: i32,
    pages: Option<&HashSet<usize>>,
) -> WorkerResult<()> {
    let mut editor = PdfEditor::open(input)?;
    let total = editor.page_count();
    for index in 1..=total {
        if pages.map(|set| set.contains(&index)).unwrap_or(true) {
            editor.rotate_page(index - 1, angle)?;
        }
    }
    editor.save(output)?;
    Ok(())
}

/// Drops `remove` (1-based page numbers) from the document. The caller is
/// responsible for the empty-selection identity shortcut (§4.7).
pub fn remove_pages(input: &Path, output: &Path, remove: &HashSet<usize>) -> WorkerResult<()> {
    let doc = OxideDocument::open(input)?;
    let mut editor = PdfEditor::new();
    for page in 1..=doc.page_count() {
        if !remove.contains(&page) {
            editor.append_page(&doc, page - 1)?;
        }
    }
    editor.save(output)?;
    Ok(())
}

/// Rebuilds the document in the given 1-based page order (may repeat or
/// omit pages).
pub fn reorder_pages(input: &Path, output: &Path, order: &[usize]) -> WorkerResult<()> {
    let doc = OxideDocument::open(input)?;
    let mut editor = PdfEditor::new();
    for page in order {
        editor.append_page(&doc, page - 1)?;
    }
    editor.save(output)?;
    Ok(())
}

/// Crops `pages` (`None` means every page) by `margins`, failing if any
/// targeted page's remaining area would be non-positive.
pub fn crop(
    input: &Path,
    output: &Path,
    margins: Margins,
    pages: Option<&HashSet<usize>>,
) -> WorkerResult<()> {
    let mut editor = PdfEditor::open(input)?;
    let total = editor.page_count();
    for index in 1..=total {
        if !pages.map(|set| set.contains(&index)).unwrap_or(true) {
            continue;
        }
        let (width, height) = editor.page_size(index - 1)?;
        let new_width = width - margins.left - margins.right;
        let new_height = height - margins.top - margins.bottom;
        if new_width <= 0.0 || new_height <= 0.0 {
            return Err(WorkerError::user(format!(
                "margins remove all content from page {index}"
            )));
        }
        editor.crop_page(
            index - 1,
            margins.left,
            margins.bottom,
            new_width,
            new_height,
        )?;
    }
    editor.save(output)?;
    Ok(())
}

/// Draws `text` onto `pages` (`None` means every page) at the given anchor,
/// in gray, sized proportionally to the page's shorter dimension. Used by
/// both `watermark` and, with a right-aligned footer anchor, by
/// `page-numbers`.
pub fn draw_text_overlay(
    input: &Path,
    output: &Path,
    pages: Option<&HashSet<usize>>,
    text_for_page: impl Fn(usize) -> String,
    anchor: TextAnchor,
) -> WorkerResult<()> {
    let mut editor = PdfEditor::open(input)?;
    let total = editor.page_count();
    for index in 1..=total {
        if !pages.map(|set| set.contains(&index)).unwrap_or(true) {
            continue;
        }
        let text = text_for_page(index);
        if text.is_empty() {
            continue;
        }
        let (width, height) = editor.page_size(index - 1)?;
        let min_dim = width.min(height);
        let font_size = (min_dim * 0.08).max(10.0);
        let (x, y) = match anchor {
            TextAnchor::Center => (width / 2.0, height / 2.0),
            TextAnchor::FooterRight => (width - min_dim * 0.1, min_dim * 0.05),
        };
        editor.draw_text_gray(index - 1, &text, x, y, font_size, 0.5)?;
    }
    editor.save(output)?;
    Ok(())
}

/// Finds every occurrence of `needle` (exact, case-sensitive match) across
/// the document, returning `(page_index, rect)` pairs in document order.
pub fn find_text(input: &Path, needle: &str) -> WorkerResult<Vec<(usize, pdf_oxide::search::Rect)>> {
    let doc = OxideDocument::open(input)?;
    let mut hits = Vec::new();
    for page in 0..doc.page_count() {
        for rect in pdf_oxide::search::find_in_page(&doc, page, needle)? {
            hits.push((page, rect));
        }
    }
    Ok(hits)
}

/// Draws an opaque black box (redact) or a translucent yellow box
/// (highlight) over every hit returned by [`find_text`].
pub fn mark_text_hits(
    input: &Path,
    output: &Path,
    hits: &[(usize, pdf_oxide::search::Rect)],
    opaque: bool,
) -> WorkerResult<()> {
    let mut editor = PdfEditor::open(input)?;
    for (page, rect) in hits {
        if opaque {
            editor.draw_filled_rect(*page, *rect, (0.0, 0.0, 0.0), 1.0)?;
        } else {
            editor.draw_filled_rect(*page, *rect, (1.0, 1.0, 0.0), 0.4)?;
        }
    }
    editor.save(output)?;
    Ok(())
}

/// Re-emits every page of `input` into `output`, compressing content
/// streams and carrying forward stringified metadata — the library-rewrite
/// fallback when neither `mutool` nor `qpdf` is on `PATH` (normalize stage,
/// §4.6 step 1), and the implementation of the `repair` tool.
pub fn rewrite_compressed(input: &Path, output: &Path) -> WorkerResult<()> {
    let doc = OxideDocument::open(input)?;
    let mut editor = PdfEditor::new();
    for page in 0..doc.page_count() {
        editor.append_page(&doc, page)?;
    }
    editor.compress_content_streams();
    let meta = doc.metadata();
    editor.set_metadata(pdf_oxide::document::Metadata {
        title: meta.title.clone(),
        author: meta.author.clone(),
        subject: meta.subject.clone(),
        keywords: meta.keywords.clone(),
    });
    editor.save(output)?;
    Ok(())
}

/// Builds a single PDF embedding each input image as a full-bleed page, for
/// `image-to-pdf`.
pub fn images_to_pdf(images: &[PathBuf], output: &Path) -> WorkerResult<()> {
    let mut builder = DocumentBuilder::new();
    for path in images {
        let img = image::open(path)?;
        builder.add_image_page(&img)?;
    }
    builder.save(output)?;
    Ok(())
}

/// Renders every page of `input` as a JPEG at `dpi`, writing
/// `page_{n}.jpg` files into `output_dir` and returning their paths in
/// page order.
pub fn render_pages_to_jpg(input: &Path, output_dir: &Path, dpi: u32) -> WorkerResult<Vec<PathBuf>> {
    let doc = OxideDocument::open(input)?;
    let mut paths = Vec::with_capacity(doc.page_count());
    for page in 0..doc.page_count() {
        let pixmap = doc.render_page(page, dpi)?;
        let path = output_dir.join(format!("page_{}.jpg", page + 1));
        pixmap.save_jpeg(&path)?;
        paths.push(path);
    }
    Ok(paths)
}

/// Encrypts `input` with `password`, failing if it is already encrypted
/// (the `protect` tool never re-wraps an already-protected file).
pub fn encrypt(input: &Path, output: &Path, password: &str) -> WorkerResult<()> {
    let doc = OxideDocument::open(input)?;
    if doc.is_encrypted() {
        return Err(WorkerError::user("PDF is already encrypted"));
    }
    let mut editor = PdfEditor::new();
    for page in 0..doc.page_count() {
        editor.append_page(&doc, page)?;
    }
    editor.set_password(password);
    editor.save(output)?;
    Ok(())
}

/// Decrypts `input` with `password` into a plain `output`, for `unlock`.
pub fn decrypt(input: &Path, output: &Path, password: &str) -> WorkerResult<()> {
    let doc = OxideDocument::open_encrypted(input, password)
        .map_err(|_| WorkerError::user("Incorrect password"))?;
    let mut editor = PdfEditor::new();
    for page in 0..doc.page_count() {
        editor.append_page(&doc, page)?;
    }
    let meta = doc.metadata();
    editor.set_metadata(pdf_oxide::document::Metadata {
        title: meta.title.clone(),
        author: meta.author.clone(),
        subject: meta.subject.clone(),
        keywords: meta.keywords.clone(),
    });
    editor.save(output)?;
    Ok(())
}

/// Renders plain text as a simple single-column PDF, for `web-to-pdf`.
pub fn text_to_pdf(text: &str, output: &Path) -> WorkerResult<()> {
    let mut builder = DocumentBuilder::new();
    builder.add_text_document(text, 11.0);
    builder.save(output)?;
    Ok(())
}

pub use pdf_oxide::Error as PdfError;

//! Image-heavy classification (§4.6): samples up to 10 evenly-spaced pages
//! and flags documents where images dominate over extractable text.

use crate::error::WorkerResult;
use crate::pdf::PdfHandle;

const MAX_SAMPLE_PAGES: usize = 10;
const TEXT_PER_PAGE_THRESHOLD: f64 = 500.0;
const IMAGES_PER_PAGE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ImageMetrics {
    pub image_heavy: bool,
    pub images_per_page: f64,
    pub text_chars_per_page: f64,
}

/// Samples up to [`MAX_SAMPLE_PAGES`] evenly-spaced pages of `handle` and
/// decides image-heaviness: `images >= pages` (projected from the sample)
/// OR `(textPerPage < 500 AND imagesPerPage > 0.5)`.
pub fn classify(handle: &PdfHandle) -> WorkerResult<ImageMetrics> {
    let total_pages = handle.page_count().max(1);
    let sample_count = total_pages.min(MAX_SAMPLE_PAGES);
    let stride = (total_pages as f64 / sample_count as f64).max(1.0);

    let mut sampled_images = 0usize;
    let mut sampled_chars = 0usize;
    let mut sampled_pages = 0usize;

    for i in 0..sample_count {
        let page_index = ((i as f64) * stride).floor() as usize;
        if page_index >= total_pages {
            continue;
        }
        sampled_images += handle.image_count(page_index).unwrap_or(0);
        sampled_chars += handle.extract_text(page_index).map(|t| t.chars().count()).unwrap_or(0);
        sampled_pages += 1;
    }

    let sampled_pages = sampled_pages.max(1);
    let images_per_page = sampled_images as f64 / sampled_pages as f64;
    let text_chars_per_page = sampled_chars as f64 / sampled_pages as f64;

    // Project the sampled image count across the whole document to compare
    // against total page count, per the spec's `images >= pages` clause.
    let projected_images = images_per_page * total_pages as f64;
    let image_heavy = projected_images >= total_pages as f64
        || (text_chars_per_page < TEXT_PER_PAGE_THRESHOLD && images_per_page > IMAGES_PER_PAGE_THRESHOLD);

    Ok(ImageMetrics {
        image_heavy,
        images_per_page,
        text_chars_per_page,
    })
}

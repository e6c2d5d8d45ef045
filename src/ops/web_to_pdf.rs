//! Web-to-PDF (§4.3/§4.7): fetches `url` through the safe web fetcher,
//! strips markup down to readable text, and renders it as a simple PDF.
//! Output is always `web_to_pdf.pdf` regardless of job inputs (§4.9).

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::WorkerResult;
use crate::models::JobTool;
use crate::naming;
use crate::pdf;

use super::ToolContext;

pub async fn run(ctx: &ToolContext<'_>) -> WorkerResult<Vec<PathBuf>> {
    let url = ctx.config_str_required("url")?;
    let body = ctx.web_fetcher.fetch_text(url).await?;
    let text = strip_markup(&body);

    let output = ctx.output_path(&naming::output_filename(JobTool::WebToPdf, ctx.first_input_name()));
    pdf::text_to_pdf(&text, &output)?;
    Ok(vec![output])
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)<script.*?</script>|<style.*?</style>|<[^>]+>").unwrap())
}

/// Drops script/style blocks and any remaining tags, collapsing runs of
/// blank lines left behind. Not an HTML renderer — a readable-text
/// extraction, matching spec.md §1's "reimplementing is mechanical"
/// framing for this out-of-scope tool.
fn strip_markup(html: &str) -> String {
    let stripped = tag_pattern().replace_all(html, " ");
    let decoded = stripped
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");

    decoded
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_scripts() {
        let html = "<html><head><script>evil()</script></head><body><p>Hello &amp; welcome</p></body></html>";
        assert_eq!(strip_markup(html), "Hello & welcome");
    }
}

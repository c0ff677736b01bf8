use std::path::Path;

use anyhow::Context;
use offscrape_scraper::{classify_page, extract_product};

/// Offline selector debugging: runs the classifier and the extractor on a
/// saved page and prints the record.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the extracted values
/// violate the record model.
pub(crate) fn run_extract(html_path: &Path, url: &str) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(html_path)
        .with_context(|| format!("cannot read {}", html_path.display()))?;

    match classify_page(&html) {
        Some(signal) => tracing::info!(signal = %signal, "product page detected"),
        None => tracing::warn!("no product page signal found; extracting anyway"),
    }

    let record = extract_product(&html, url).context("extraction failed")?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

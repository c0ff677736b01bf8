use std::io::ErrorKind;
use std::path::Path;

use offscrape_core::ScrapeTarget;

use crate::error::ScraperError;

/// Reads one target per non-blank line.
///
/// # Errors
///
/// - [`ScraperError::InputFileNotFound`] if `path` does not exist.
/// - [`ScraperError::InputRead`] for any other I/O failure.
pub fn load_targets(path: &Path) -> Result<Vec<ScrapeTarget>, ScraperError> {
    let contents = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ScraperError::InputFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ScraperError::InputRead {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    Ok(parse_targets(&contents))
}

pub(crate) fn parse_targets(contents: &str) -> Vec<ScrapeTarget> {
    contents.lines().filter_map(ScrapeTarget::parse).collect()
}

use std::path::PathBuf;

use offscrape_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("unexpected content-type \"{content_type}\" from {url}")]
    ContentType { content_type: String, url: String },

    #[error("input file not found: {}", path.display())]
    InputFileNotFound { path: PathBuf },

    #[error("failed to read input file {}: {source}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("extracted record is invalid: {0}")]
    Record(#[from] CoreError),
}

impl ScraperError {
    /// Network, DNS, timeout or non-2xx status. These are the failures the
    /// fetch retry policy is allowed to retry.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ScraperError::Http(_) | ScraperError::UnexpectedStatus { .. }
        )
    }
}

use std::fmt;

/// One line of the input list: a bare product code or a full product URL.
///
/// The token is kept verbatim (after trimming) so that log lines and failure
/// reports show exactly what the user supplied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScrapeTarget(String);

impl ScrapeTarget {
    /// Builds a target from one raw input line. Returns `None` for blank lines.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_owned()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the token is a bare 8–14 digit product code.
    #[must_use]
    pub fn is_barcode(&self) -> bool {
        is_barcode(&self.0)
    }

    /// Returns `true` when the token already carries an `http(s)` scheme.
    #[must_use]
    pub fn is_url(&self) -> bool {
        let lower = self.0.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }
}

impl fmt::Display for ScrapeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `^\d{8,14}$` without pulling `regex` into the core crate.
#[must_use]
pub fn is_barcode(s: &str) -> bool {
    (8..=14).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

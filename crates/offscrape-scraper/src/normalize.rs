//! Turns an input token into the two candidate product-page URLs.
//!
//! The primary URL points at the world locale; the fallback URL points at the
//! French locale, which often serves a complete page when the world page is a
//! stub. Both are derived without any I/O.

use std::sync::LazyLock;

use offscrape_core::config::{DEFAULT_FALLBACK_BASE_URL, DEFAULT_PRIMARY_BASE_URL};
use offscrape_core::target::is_barcode;
use offscrape_core::ScrapeTarget;
use regex::Regex;

/// `/product/<digits>` or `/produit/<digits>`, where the digit run is 8–14
/// long and not the prefix of a longer number.
static PRODUCT_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:product|produit)/(\d{8,14})(?:\D|$)").expect("valid product path regex")
});

/// Extracts the barcode from a product URL path, if it has one.
#[must_use]
pub fn barcode_from_url(url: &str) -> Option<String> {
    PRODUCT_PATH_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

/// Builds locale URLs from configurable base prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlNormalizer {
    primary_base: String,
    fallback_base: String,
}

impl Default for UrlNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PRIMARY_BASE_URL, DEFAULT_FALLBACK_BASE_URL)
    }
}

impl UrlNormalizer {
    /// Bases are used as prefixes; a trailing slash is added if missing.
    #[must_use]
    pub fn new(primary_base: &str, fallback_base: &str) -> Self {
        Self {
            primary_base: with_trailing_slash(primary_base),
            fallback_base: with_trailing_slash(fallback_base),
        }
    }

    /// The world-locale URL: the token itself when it is already a URL.
    #[must_use]
    pub fn primary_url(&self, target: &ScrapeTarget) -> String {
        if target.is_url() {
            target.as_str().to_owned()
        } else {
            format!("{}{}", self.primary_base, target.as_str())
        }
    }

    /// The French-locale URL for the same product.
    ///
    /// The barcode is taken from the token, then from `primary_url` (pass the
    /// post-redirect URL when one is known). Without a barcode the raw token
    /// is appended instead.
    #[must_use]
    pub fn fallback_url(&self, target: &ScrapeTarget, primary_url: &str) -> String {
        let code = recover_barcode(target, primary_url);
        format!(
            "{}{}",
            self.fallback_base,
            code.as_deref().unwrap_or(target.as_str())
        )
    }
}

fn recover_barcode(target: &ScrapeTarget, primary_url: &str) -> Option<String> {
    if target.is_barcode() {
        return Some(target.as_str().to_owned());
    }
    barcode_from_url(target.as_str())
        .or_else(|| barcode_from_url(primary_url))
        .filter(|code| is_barcode(code))
}

fn with_trailing_slash(base: &str) -> String {
    let trimmed = base.trim();
    if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

//! Fill-ins for fields the page did not state explicitly.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::dom::{canonical_href, first_attr, selectors};
use crate::normalize::barcode_from_url;

static OG_URL: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&[r#"meta[property="og:url"]"#]));

/// A number followed by a mass or volume unit, e.g. `100g`, `1,5 l`, `2 x 125 g`.
static WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d\s.,]*\s?(?:kg|g|ml|l))\b").expect("valid weight regex")
});

/// Barcode from the product path of the page URL, then of `og:url`, then of
/// the canonical link.
pub(crate) fn barcode_from_page(document: &Html, url: &str) -> Option<String> {
    barcode_from_url(url)
        .or_else(|| first_attr(document, &OG_URL, "content").and_then(|u| barcode_from_url(&u)))
        .or_else(|| canonical_href(document).and_then(|u| barcode_from_url(&u)))
}

/// Quantity token embedded in a product name, with spaces removed.
pub(crate) fn weight_from_name(name: &str) -> Option<String> {
    WEIGHT_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().chars().filter(|c| !c.is_whitespace()).collect())
}

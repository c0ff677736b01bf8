//! Decides whether fetched HTML is a real product page.
//!
//! Stub pages (search results, "product not found", locale splash pages)
//! are served with a 200 status, so the status code alone says nothing.

use std::fmt;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::extract::dom::{canonical_href, first_attr, selectors};
use crate::extract::jsonld::{is_product_node, jsonld_nodes};

static OG_TYPE: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&[r#"meta[property="og:type"]"#]));

const PRODUCT_OG_TYPES: [&str; 2] = ["product", "food"];
const PRODUCT_PATHS: [&str; 2] = ["/product/", "/produit/"];

/// The signal that identified a product page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSignal {
    /// `og:type` is `product` or `food`.
    OgType,
    /// The canonical link points at a product path.
    Canonical,
    /// A JSON-LD block declares a `Product` node.
    JsonLd,
}

impl fmt::Display for ProductSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OgType => "og:type",
            Self::Canonical => "canonical",
            Self::JsonLd => "json-ld",
        };
        f.write_str(s)
    }
}

/// `true` if any product-page signal is present.
#[must_use]
pub fn is_product_page(html: &str) -> bool {
    classify_page(html).is_some()
}

/// Returns the first product-page signal found, checking the cheapest first.
#[must_use]
pub fn classify_page(html: &str) -> Option<ProductSignal> {
    classify_document(&Html::parse_document(html))
}

pub(crate) fn classify_document(document: &Html) -> Option<ProductSignal> {
    if has_product_og_type(document) {
        Some(ProductSignal::OgType)
    } else if has_product_canonical(document) {
        Some(ProductSignal::Canonical)
    } else if has_product_jsonld(document) {
        Some(ProductSignal::JsonLd)
    } else {
        None
    }
}

fn has_product_og_type(document: &Html) -> bool {
    first_attr(document, &OG_TYPE, "content").is_some_and(|content| {
        PRODUCT_OG_TYPES
            .iter()
            .any(|t| content.eq_ignore_ascii_case(t))
    })
}

fn has_product_canonical(document: &Html) -> bool {
    canonical_href(document).is_some_and(|href| PRODUCT_PATHS.iter().any(|p| href.contains(p)))
}

fn has_product_jsonld(document: &Html) -> bool {
    jsonld_nodes(document).iter().any(is_product_node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn og_type_food_or_product() {
        let food = r#"<meta property="og:type" content="food">"#;
        let product = r#"<meta property="og:type" content=" Product ">"#;
        assert_eq!(classify_page(food), Some(ProductSignal::OgType));
        assert_eq!(classify_page(product), Some(ProductSignal::OgType));
        assert!(!is_product_page(r#"<meta property="og:type" content="website">"#));
    }

    #[test]
    fn canonical_product_path() {
        let en = r#"<link rel="canonical" href="https://world.openfoodfacts.org/product/3017620422003">"#;
        let fr = r#"<link rel="canonical" href="https://fr.openfoodfacts.org/produit/3017620422003/nutella">"#;
        assert_eq!(classify_page(en), Some(ProductSignal::Canonical));
        assert_eq!(classify_page(fr), Some(ProductSignal::Canonical));
        assert!(!is_product_page(
            r#"<link rel="canonical" href="https://world.openfoodfacts.org/cgi/search.pl">"#
        ));
    }

    #[test]
    fn jsonld_product_node() {
        let html = r#"<script type="application/ld+json">[{"@type":"WebPage"},{"@type":"Product","name":"X"}]</script>"#;
        assert_eq!(classify_page(html), Some(ProductSignal::JsonLd));
    }

    #[test]
    fn malformed_jsonld_is_not_a_signal() {
        let html = r#"<script type="application/ld+json">{"@type": "Product",</script>"#;
        assert!(!is_product_page(html));
    }

    #[test]
    fn cheapest_signal_reported_first() {
        let html = r#"
            <meta property="og:type" content="food">
            <link rel="canonical" href="https://x.org/product/12345678">
            <script type="application/ld+json">{"@type":"Product"}</script>"#;
        assert_eq!(classify_page(html), Some(ProductSignal::OgType));
    }

    #[test]
    fn page_without_any_signal_is_rejected() {
        let html = r#"<html><head><title>Produit introuvable</title>
            <meta property="og:type" content="website"></head>
            <body><h1>Erreur</h1></body></html>"#;
        assert!(!is_product_page(html));
        assert_eq!(classify_page(html), None);
        assert!(!is_product_page(""));
    }
}

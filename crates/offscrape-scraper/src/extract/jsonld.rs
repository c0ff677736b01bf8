//! schema.org JSON-LD blocks embedded in the page.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;

use super::dom::selector;

static JSONLD_SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"script[type="application/ld+json"]"#));

/// Fields the extractor reads from a `Product` node.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct StructuredProduct {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub image: Option<String>,
    pub barcode: Option<String>,
    pub price: Option<f64>,
}

/// Every JSON-LD node on the page, in document order.
///
/// Top-level arrays and `@graph` containers are flattened. Blocks that are
/// not valid JSON are skipped.
pub(crate) fn jsonld_nodes(document: &Html) -> Vec<Value> {
    let mut nodes = Vec::new();

    for script in document.select(&JSONLD_SCRIPT) {
        let raw: String = script.text().collect();
        let value: Value = match serde_json::from_str(raw.trim()) {
            Ok(v) => v,
            Err(err) => {
                tracing::debug!(error = %err, "skipping malformed JSON-LD block");
                continue;
            }
        };

        let top_level = match value {
            Value::Array(items) => items,
            other => vec![other],
        };

        for item in top_level {
            if let Some(graph) = item.get("@graph").and_then(Value::as_array) {
                nodes.extend(graph.iter().cloned());
            }
            nodes.push(item);
        }
    }

    nodes
}

/// `@type` is `Product`, as a string or as one entry of a list.
pub(crate) fn is_product_node(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("product"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|s| s.trim().eq_ignore_ascii_case("product")),
        _ => false,
    }
}

/// The first `Product` node on the page, if any.
pub(crate) fn find_product(document: &Html) -> Option<StructuredProduct> {
    jsonld_nodes(document)
        .iter()
        .find(|node| is_product_node(node))
        .map(StructuredProduct::from_node)
}

impl StructuredProduct {
    pub(crate) fn from_node(node: &Value) -> Self {
        Self {
            name: node.get("name").and_then(scalar_string),
            brand: node.get("brand").and_then(brand_name),
            image: node.get("image").and_then(first_image),
            barcode: ["gtin13", "gtin", "sku"]
                .iter()
                .find_map(|key| node.get(*key).and_then(scalar_string)),
            price: node.get("offers").and_then(offer_price),
        }
    }
}

/// Non-blank string, or a number rendered as a string.
fn scalar_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn brand_name(value: &Value) -> Option<String> {
    match value {
        Value::Object(_) => value.get("name").and_then(scalar_string),
        Value::Array(items) => items.first().and_then(brand_name),
        other => scalar_string(other),
    }
}

fn first_image(value: &Value) -> Option<String> {
    match value {
        Value::String(_) => scalar_string(value),
        Value::Array(items) => items.first().and_then(first_image),
        Value::Object(_) => value
            .get("url")
            .or_else(|| value.get("contentUrl"))
            .and_then(scalar_string),
        _ => None,
    }
}

fn offer_price(offers: &Value) -> Option<f64> {
    match offers {
        Value::Object(_) => offers.get("price").and_then(parse_price),
        Value::Array(items) => items.first().and_then(offer_price),
        _ => None,
    }
}

/// Accepts a non-negative number or a plain decimal string (`"3.49"`).
/// Signs, exponents, thousands separators and currency symbols are rejected.
pub(crate) fn parse_price(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|p| p.is_finite() && *p >= 0.0),
        Value::String(s) => {
            let s = s.trim();
            if is_plain_decimal(s) {
                s.parse::<f64>().ok().filter(|p| p.is_finite())
            } else {
                None
            }
        }
        _ => None,
    }
}

fn is_plain_decimal(s: &str) -> bool {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    all_digits(int_part) && frac_part.is_none_or(all_digits)
}

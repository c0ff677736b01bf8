//! Small DOM lookup helpers shared by the extraction passes.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

/// Parses a list of compile-time CSS selectors.
pub(crate) fn selectors(list: &[&str]) -> Vec<Selector> {
    list.iter()
        .map(|css| Selector::parse(css).expect("valid CSS selector"))
        .collect()
}

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static DEFINITION_TERM: LazyLock<Selector> = LazyLock::new(|| selector("dt"));
static CANONICAL_LINK: LazyLock<Selector> = LazyLock::new(|| selector("link[rel]"));

/// Whitespace-collapsed text of an element, `None` when blank.
pub(crate) fn element_text(element: ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Text of the first element matching any selector, tried in order.
pub(crate) fn first_text(document: &Html, candidates: &[Selector]) -> Option<String> {
    candidates
        .iter()
        .find_map(|sel| document.select(sel).find_map(element_text))
}

/// Non-blank anchor texts inside the first element matching `container`.
/// An empty list is reported as absent.
pub(crate) fn anchor_texts(document: &Html, container: &Selector) -> Option<Vec<String>> {
    let element = document.select(container).next()?;
    let texts: Vec<String> = element.select(&ANCHOR).filter_map(element_text).collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts)
    }
}

/// Anchor texts joined with `", "`.
pub(crate) fn joined_anchor_texts(document: &Html, container: &Selector) -> Option<String> {
    anchor_texts(document, container).map(|texts| texts.join(", "))
}

/// Non-blank `attr` of the first element matching any selector.
pub(crate) fn first_attr(document: &Html, candidates: &[Selector], attr: &str) -> Option<String> {
    candidates.iter().find_map(|sel| {
        document.select(sel).find_map(|el| {
            el.value()
                .attr(attr)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        })
    })
}

/// `href` of the first `<link>` whose `rel` list contains `canonical`.
pub(crate) fn canonical_href(document: &Html) -> Option<String> {
    document.select(&CANONICAL_LINK).find_map(|el| {
        let value = el.value();
        let is_canonical = value.attr("rel").is_some_and(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("canonical"))
        });
        if is_canonical {
            value.attr("href").map(|h| h.trim().to_owned())
        } else {
            None
        }
    })
}

/// Text of the `<dd>` that follows the first `<dt>` whose text contains one
/// of `labels` (case-insensitive).
pub(crate) fn definition_value(document: &Html, labels: &[&str]) -> Option<String> {
    let lowered: Vec<String> = labels.iter().map(|l| l.to_lowercase()).collect();
    for label in &lowered {
        let found = document.select(&DEFINITION_TERM).find(|dt| {
            element_text(*dt).is_some_and(|text| text.to_lowercase().contains(label.as_str()))
        });
        let Some(dt) = found else {
            continue;
        };
        let dd = dt
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "dd");
        if let Some(text) = dd.and_then(element_text) {
            return Some(text);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_text_collapses_whitespace() {
        let doc = Html::parse_document("<p id=x>  Pâte \n à   <b>tartiner</b> </p>");
        let el = doc.select(&selector("#x")).next().unwrap();
        assert_eq!(element_text(el).as_deref(), Some("Pâte à tartiner"));
    }

    #[test]
    fn first_text_skips_blank_matches() {
        let doc = Html::parse_document("<h1 class=a>  </h1><h1 class=b>Nutella</h1>");
        let sels = selectors(&["h1.a", "h1.b"]);
        assert_eq!(first_text(&doc, &sels).as_deref(), Some("Nutella"));
    }

    #[test]
    fn anchor_texts_empty_list_is_absent() {
        let doc = Html::parse_document("<span id=c>no links</span><span id=d><a> </a></span>");
        assert!(anchor_texts(&doc, &selector("#c")).is_none());
        assert!(anchor_texts(&doc, &selector("#d")).is_none());
        assert!(anchor_texts(&doc, &selector("#missing")).is_none());
    }

    #[test]
    fn joined_anchor_texts_uses_comma_space() {
        let doc = Html::parse_document(
            r#"<span id="field_countries_value"><a href="/a">France</a>, <a href="/b">Belgique</a></span>"#,
        );
        assert_eq!(
            joined_anchor_texts(&doc, &selector("#field_countries_value")).as_deref(),
            Some("France, Belgique")
        );
    }

    #[test]
    fn canonical_href_reads_rel_token() {
        let doc = Html::parse_document(
            r#"<head><link rel="alternate" href="/a"><link rel="Canonical" href=" https://x.org/product/12345678 "></head>"#,
        );
        assert_eq!(
            canonical_href(&doc).as_deref(),
            Some("https://x.org/product/12345678")
        );
    }

    #[test]
    fn definition_value_follows_label() {
        let doc = Html::parse_document(
            "<dl><dt>Marque</dt><dd>Ferrero</dd><dt>Quantité :</dt><dd> 400 g </dd></dl>",
        );
        assert_eq!(
            definition_value(&doc, &["Quantity", "quantité"]).as_deref(),
            Some("400 g")
        );
        assert!(definition_value(&doc, &["Packaging"]).is_none());
    }
}

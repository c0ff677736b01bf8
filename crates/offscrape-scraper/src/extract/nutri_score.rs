use std::sync::LazyLock;

use offscrape_core::NutriScore;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::dom::selector;

static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h1, h2, h3, h4, h5, h6"));

static TEXT_GRADE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Nutri-Score\s*:?\s*([A-E])\b").expect("valid nutri-score text regex")
});
static CLASS_GRADE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"grade_([a-e])_title").expect("valid grade class regex"));

const GRADE_ATTRIBUTES: [&str; 3] = ["data-grade", "data-nutri-score", "data-score"];

/// Reads the grade from the first heading mentioning "Nutri-Score".
///
/// The heading's own text is tried first, then a `grade_<x>_title` class,
/// then a single-letter grade attribute.
pub(crate) fn extract_nutri_score(document: &Html) -> Option<NutriScore> {
    let heading = document
        .select(&HEADING)
        .find(|h| h.text().collect::<String>().contains("Nutri-Score"))?;

    from_text(heading)
        .or_else(|| from_class(heading))
        .or_else(|| from_attributes(heading))
}

fn from_text(heading: ElementRef<'_>) -> Option<NutriScore> {
    let text = heading
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ");
    let caps = TEXT_GRADE_RE.captures(&text)?;
    caps.get(1)
        .and_then(|m| m.as_str().chars().next())
        .and_then(NutriScore::from_letter)
}

fn from_class(heading: ElementRef<'_>) -> Option<NutriScore> {
    let class = heading.value().attr("class")?.to_lowercase();
    let caps = CLASS_GRADE_RE.captures(&class)?;
    caps.get(1)
        .and_then(|m| m.as_str().chars().next())
        .and_then(NutriScore::from_letter)
}

fn from_attributes(heading: ElementRef<'_>) -> Option<NutriScore> {
    GRADE_ATTRIBUTES.iter().find_map(|attr| {
        let value = heading.value().attr(attr)?.trim();
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => NutriScore::from_letter(c),
            _ => None,
        }
    })
}

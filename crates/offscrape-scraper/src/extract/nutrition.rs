//! Nutrition facts table parsing.
//!
//! The table layout differs between locales and page versions, so rows are
//! matched by keyword on their concatenated cell text rather than by
//! position.

use std::sync::LazyLock;

use offscrape_core::{CoreError, NutrimentData};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::dom::{selector, selectors};

static TABLE_BY_ID: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&["table#nutrition_table", "table#nutrition_data_table"])
});
static TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("th, td"));

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)").expect("valid number regex"));
static KCAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:[.,]\d+)?)\s*kcal").expect("valid kcal regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nutrient {
    Calories,
    Protides,
    Glucides,
    Lipides,
}

/// Keyword groups, matched against the lower-cased row text.
const KEYWORDS: [(Nutrient, &[&str]); 4] = [
    (Nutrient::Calories, &["énergie", "energy", "kcal", "kj"]),
    (Nutrient::Protides, &["protéines", "protein"]),
    (Nutrient::Glucides, &["glucides", "carbohydrate"]),
    (Nutrient::Lipides, &["matières grasses", "fat"]),
];

/// Values collected while scanning rows.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct NutrientScan {
    pub protides: Option<f64>,
    pub glucides: Option<f64>,
    pub lipides: Option<f64>,
    pub calories: Option<f64>,
    calories_in_kcal: bool,
}

impl NutrientScan {
    /// Feeds one row. The first match wins for each nutrient, except that an
    /// explicit kcal value replaces an energy value read without a unit.
    pub(crate) fn scan_row(&mut self, row_text: &str) {
        let lower = row_text.to_lowercase();
        for (nutrient, keywords) in KEYWORDS {
            if !keywords.iter().any(|k| lower.contains(k)) {
                continue;
            }
            match nutrient {
                Nutrient::Calories => {
                    if self.calories_in_kcal {
                        continue;
                    }
                    if let Some(kcal) = first_capture(&KCAL_RE, &lower) {
                        self.calories = Some(kcal);
                        self.calories_in_kcal = true;
                    } else if self.calories.is_none() {
                        self.calories = first_capture(&NUMBER_RE, &lower);
                    }
                }
                Nutrient::Protides => {
                    self.protides = self.protides.or_else(|| first_capture(&NUMBER_RE, &lower));
                }
                Nutrient::Glucides => {
                    self.glucides = self.glucides.or_else(|| first_capture(&NUMBER_RE, &lower));
                }
                Nutrient::Lipides => {
                    self.lipides = self.lipides.or_else(|| first_capture(&NUMBER_RE, &lower));
                }
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`CoreError::NutrientOutOfRange`] if a scanned value is above
    /// 10000.
    pub(crate) fn into_nutriments(self) -> Result<NutrimentData, CoreError> {
        NutrimentData::new(self.protides, self.glucides, self.lipides, self.calories)
    }
}

/// Parses the page's nutrition table. A page without one yields empty
/// nutriments.
///
/// # Errors
///
/// Returns [`CoreError::NutrientOutOfRange`] if the table holds a value the
/// record model rejects.
pub(crate) fn parse_nutrition_table(document: &Html) -> Result<NutrimentData, CoreError> {
    let Some(table) = find_nutrition_table(document) else {
        return Ok(NutrimentData::default());
    };

    let mut scan = NutrientScan::default();
    for row in table.select(&ROW) {
        let text = row_text(row);
        if !text.is_empty() {
            scan.scan_row(&text);
        }
    }
    scan.into_nutriments()
}

/// By id first, then any table whose class mentions "nutrition".
fn find_nutrition_table(document: &Html) -> Option<ElementRef<'_>> {
    TABLE_BY_ID
        .iter()
        .find_map(|sel| document.select(sel).next())
        .or_else(|| {
            document.select(&TABLE).find(|table| {
                table
                    .value()
                    .attr("class")
                    .is_some_and(|class| class.to_lowercase().contains("nutrition"))
            })
        })
}

fn row_text(row: ElementRef<'_>) -> String {
    row.select(&CELL)
        .map(|cell| {
            cell.text()
                .flat_map(str::split_whitespace)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_capture(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
}

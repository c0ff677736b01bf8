//! HTML → [`ProductRecord`] extraction.
//!
//! Embedded JSON-LD is read first; each field it leaves empty falls back to
//! an ordered list of DOM selectors. The nutrition table and the nutri-score
//! are DOM-only. Missing data never fails extraction; only values the record
//! model rejects do.

mod backfill;
pub(crate) mod dom;
pub(crate) mod jsonld;
mod nutri_score;
mod nutrition;

use std::sync::LazyLock;

use offscrape_core::{CoreError, ProductRecord};
use scraper::{Html, Selector};

use dom::{
    anchor_texts, definition_value, element_text, first_attr, first_text, joined_anchor_texts,
    selector, selectors,
};

use backfill::weight_from_name;

static NAME: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&[
        r#"h1[property="food:name"][itemprop="name"]"#,
        r#"h1[itemprop="name"]"#,
    ])
});
static GENERIC_NAME: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&[
        r#"#field_generic_name_value [itemprop="description"]"#,
        "#field_generic_name_value",
    ])
});
static BARCODE: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&[r#"span#barcode[itemprop="gtin13"]"#, "#barcode"]));
static QUANTITY: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&["#field_quantity_value"]));
static PACKAGING: LazyLock<Vec<Selector>> =
    LazyLock::new(|| selectors(&["#field_packaging_value"]));
static BRANDS: LazyLock<Selector> = LazyLock::new(|| selector("#field_brands_value"));
static CATEGORIES: LazyLock<Selector> = LazyLock::new(|| selector("#field_categories_value"));
static ORIGINS: LazyLock<Selector> = LazyLock::new(|| selector("#field_origins_value"));
static MANUFACTURING_PLACES: LazyLock<Selector> =
    LazyLock::new(|| selector("#field_manufacturing_places_value"));
static STORES: LazyLock<Selector> = LazyLock::new(|| selector("#field_stores_value"));
static COUNTRIES: LazyLock<Selector> = LazyLock::new(|| selector("#field_countries_value"));
static IMAGE_META: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    selectors(&[r#"meta[name="x:image"]"#, r#"meta[property="og:image"]"#])
});

const QUANTITY_LABELS: [&str; 2] = ["Quantité", "Quantity"];
const PACKAGING_LABELS: [&str; 2] = ["Conditionnement", "Packaging"];

/// Parses a product page into a record whose `source` is `url`.
///
/// # Errors
///
/// Returns a [`CoreError`] when an extracted value violates the record
/// model, e.g. a nutrient above 10000.
pub fn extract_product(html: &str, url: &str) -> Result<ProductRecord, CoreError> {
    let document = Html::parse_document(html);
    extract_from_document(&document, url)
}

pub(crate) fn extract_from_document(
    document: &Html,
    url: &str,
) -> Result<ProductRecord, CoreError> {
    let structured = jsonld::find_product(document).unwrap_or_default();

    let name = structured.name.or_else(|| first_text(document, &NAME));
    let brand = structured
        .brand
        .or_else(|| document.select(&BRANDS).next().and_then(element_text));
    let barcode = structured
        .barcode
        .or_else(|| first_text(document, &BARCODE))
        .or_else(|| backfill::barcode_from_page(document, url));
    let image = structured
        .image
        .or_else(|| first_attr(document, &IMAGE_META, "content"));

    let quantity = first_text(document, &QUANTITY)
        .or_else(|| definition_value(document, &QUANTITY_LABELS))
        .or_else(|| name.as_deref().and_then(weight_from_name));
    let packaging = first_text(document, &PACKAGING)
        .or_else(|| definition_value(document, &PACKAGING_LABELS));

    let nutriments = nutrition::parse_nutrition_table(document)?;

    ProductRecord::builder(url)
        .name(name)
        .generic_name(first_text(document, &GENERIC_NAME))
        .brand(brand)
        .brand_tags(anchor_texts(document, &BRANDS))
        .price(structured.price)
        .image(image)
        .nutri_score(nutri_score::extract_nutri_score(document))
        .nutriments(nutriments)
        .quantity(quantity)
        .packaging(packaging)
        .categories(anchor_texts(document, &CATEGORIES))
        .origin(joined_anchor_texts(document, &ORIGINS))
        .manufacturing_place(joined_anchor_texts(document, &MANUFACTURING_PLACES))
        .countries_of_sale(joined_anchor_texts(document, &COUNTRIES))
        .retailer(joined_anchor_texts(document, &STORES))
        .barcode(barcode)
        .build()
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;

//! The canonical product record produced by the extraction pipeline.
//!
//! Serialized field names follow the downstream cleaning stage, which reads
//! the JSONL output directly: French keys, `nutriments` always an object
//! with all four nutrient keys present (values may be `null`).

use std::fmt;

use serde::Serialize;

use crate::CoreError;

/// Upper bound (inclusive) accepted for any nutrient value.
const NUTRIENT_MAX: f64 = 10_000.0;

/// Nutrition facts per 100 g / 100 ml as read from the product page.
///
/// Every present value lies in `[0, 10000]`; [`NutrimentData::new`] rejects
/// anything else instead of clamping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NutrimentData {
    protides: Option<f64>,
    glucides: Option<f64>,
    lipides: Option<f64>,
    calories: Option<f64>,
}

impl NutrimentData {
    /// # Errors
    ///
    /// Returns [`CoreError::NutrientOutOfRange`] if any present value is
    /// negative, above 10000, or NaN.
    pub fn new(
        protides: Option<f64>,
        glucides: Option<f64>,
        lipides: Option<f64>,
        calories: Option<f64>,
    ) -> Result<Self, CoreError> {
        for (field, value) in [
            ("protides", protides),
            ("glucides", glucides),
            ("lipides", lipides),
            ("calories", calories),
        ] {
            if let Some(v) = value {
                if !(0.0..=NUTRIENT_MAX).contains(&v) {
                    return Err(CoreError::NutrientOutOfRange { field, value: v });
                }
            }
        }
        Ok(Self {
            protides,
            glucides,
            lipides,
            calories,
        })
    }

    #[must_use]
    pub fn protides(&self) -> Option<f64> {
        self.protides
    }

    #[must_use]
    pub fn glucides(&self) -> Option<f64> {
        self.glucides
    }

    #[must_use]
    pub fn lipides(&self) -> Option<f64> {
        self.lipides
    }

    #[must_use]
    pub fn calories(&self) -> Option<f64> {
        self.calories
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.protides.is_none()
            && self.glucides.is_none()
            && self.lipides.is_none()
            && self.calories.is_none()
    }
}

/// Nutri-Score grade shown on the product page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NutriScore {
    A,
    B,
    C,
    D,
    E,
}

impl NutriScore {
    /// Case-insensitive letter lookup.
    #[must_use]
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            'E' => Some(Self::E),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
        }
    }
}

impl fmt::Display for NutriScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One extracted product page. Built once through [`ProductRecordBuilder`]
/// and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    nom: Option<String>,
    #[serde(rename = "nom_générique")]
    nom_generique: Option<String>,
    marque: Option<String>,
    brands_tags: Option<Vec<String>>,
    prix: Option<f64>,
    image: Option<String>,
    score_nutritionnel: Option<NutriScore>,
    nutriments: NutrimentData,
    #[serde(rename = "poids_unité")]
    poids_unite: Option<String>,
    emballage: Option<String>,
    categories: Option<Vec<String>>,
    pays_origine: Option<String>,
    fabricant: Option<String>,
    pays_commercialisation: Option<String>,
    distributeur: Option<String>,
    code_barres: Option<String>,
    /// The site does not publish expiry dates; kept for the output schema.
    date_peremption: Option<String>,
    source: String,
    index: String,
}

impl ProductRecord {
    #[must_use]
    pub fn builder(source: impl Into<String>) -> ProductRecordBuilder {
        ProductRecordBuilder::new(source)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.nom.as_deref()
    }

    #[must_use]
    pub fn generic_name(&self) -> Option<&str> {
        self.nom_generique.as_deref()
    }

    #[must_use]
    pub fn brand(&self) -> Option<&str> {
        self.marque.as_deref()
    }

    #[must_use]
    pub fn brand_tags(&self) -> Option<&[String]> {
        self.brands_tags.as_deref()
    }

    #[must_use]
    pub fn price(&self) -> Option<f64> {
        self.prix
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    #[must_use]
    pub fn nutri_score(&self) -> Option<NutriScore> {
        self.score_nutritionnel
    }

    #[must_use]
    pub fn nutriments(&self) -> &NutrimentData {
        &self.nutriments
    }

    #[must_use]
    pub fn quantity(&self) -> Option<&str> {
        self.poids_unite.as_deref()
    }

    #[must_use]
    pub fn packaging(&self) -> Option<&str> {
        self.emballage.as_deref()
    }

    #[must_use]
    pub fn categories(&self) -> Option<&[String]> {
        self.categories.as_deref()
    }

    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.pays_origine.as_deref()
    }

    #[must_use]
    pub fn manufacturing_place(&self) -> Option<&str> {
        self.fabricant.as_deref()
    }

    #[must_use]
    pub fn countries_of_sale(&self) -> Option<&str> {
        self.pays_commercialisation.as_deref()
    }

    #[must_use]
    pub fn retailer(&self) -> Option<&str> {
        self.distributeur.as_deref()
    }

    #[must_use]
    pub fn barcode(&self) -> Option<&str> {
        self.code_barres.as_deref()
    }

    #[must_use]
    pub fn expiry_date(&self) -> Option<&str> {
        self.date_peremption.as_deref()
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// De-duplication key: the barcode when known, else the source URL.
    #[must_use]
    pub fn index(&self) -> &str {
        &self.index
    }
}

/// Incremental assembly of a [`ProductRecord`].
///
/// Setters take `Option`s so extraction strategies can pass their results
/// straight through; blank strings and empty lists are stored as absent.
#[derive(Debug, Clone, Default)]
pub struct ProductRecordBuilder {
    nom: Option<String>,
    nom_generique: Option<String>,
    marque: Option<String>,
    brands_tags: Option<Vec<String>>,
    prix: Option<f64>,
    image: Option<String>,
    score_nutritionnel: Option<NutriScore>,
    nutriments: NutrimentData,
    poids_unite: Option<String>,
    emballage: Option<String>,
    categories: Option<Vec<String>>,
    pays_origine: Option<String>,
    fabricant: Option<String>,
    pays_commercialisation: Option<String>,
    distributeur: Option<String>,
    code_barres: Option<String>,
    source: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn non_empty_list(value: Option<Vec<String>>) -> Option<Vec<String>> {
    value.filter(|v| !v.is_empty())
}

impl ProductRecordBuilder {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(mut self, value: Option<String>) -> Self {
        self.nom = non_blank(value);
        self
    }

    #[must_use]
    pub fn generic_name(mut self, value: Option<String>) -> Self {
        self.nom_generique = non_blank(value);
        self
    }

    #[must_use]
    pub fn brand(mut self, value: Option<String>) -> Self {
        self.marque = non_blank(value);
        self
    }

    #[must_use]
    pub fn brand_tags(mut self, value: Option<Vec<String>>) -> Self {
        self.brands_tags = non_empty_list(value);
        self
    }

    #[must_use]
    pub fn price(mut self, value: Option<f64>) -> Self {
        self.prix = value;
        self
    }

    #[must_use]
    pub fn image(mut self, value: Option<String>) -> Self {
        self.image = non_blank(value);
        self
    }

    #[must_use]
    pub fn nutri_score(mut self, value: Option<NutriScore>) -> Self {
        self.score_nutritionnel = value;
        self
    }

    #[must_use]
    pub fn nutriments(mut self, value: NutrimentData) -> Self {
        self.nutriments = value;
        self
    }

    #[must_use]
    pub fn quantity(mut self, value: Option<String>) -> Self {
        self.poids_unite = non_blank(value);
        self
    }

    #[must_use]
    pub fn packaging(mut self, value: Option<String>) -> Self {
        self.emballage = non_blank(value);
        self
    }

    #[must_use]
    pub fn categories(mut self, value: Option<Vec<String>>) -> Self {
        self.categories = non_empty_list(value);
        self
    }

    #[must_use]
    pub fn origin(mut self, value: Option<String>) -> Self {
        self.pays_origine = non_blank(value);
        self
    }

    #[must_use]
    pub fn manufacturing_place(mut self, value: Option<String>) -> Self {
        self.fabricant = non_blank(value);
        self
    }

    #[must_use]
    pub fn countries_of_sale(mut self, value: Option<String>) -> Self {
        self.pays_commercialisation = non_blank(value);
        self
    }

    #[must_use]
    pub fn retailer(mut self, value: Option<String>) -> Self {
        self.distributeur = non_blank(value);
        self
    }

    #[must_use]
    pub fn barcode(mut self, value: Option<String>) -> Self {
        self.code_barres = non_blank(value);
        self
    }

    /// Validates the assembled fields and derives `index`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NegativePrice`] if the price is negative or not finite.
    /// - [`CoreError::EmptyIndex`] if there is neither a barcode nor a
    ///   non-blank source URL.
    pub fn build(self) -> Result<ProductRecord, CoreError> {
        if let Some(price) = self.prix {
            if !price.is_finite() || price < 0.0 {
                return Err(CoreError::NegativePrice(price));
            }
        }

        let index = match self.code_barres.as_deref() {
            Some(code) => code.to_owned(),
            None if !self.source.trim().is_empty() => self.source.clone(),
            None => return Err(CoreError::EmptyIndex),
        };

        Ok(ProductRecord {
            nom: self.nom,
            nom_generique: self.nom_generique,
            marque: self.marque,
            brands_tags: self.brands_tags,
            prix: self.prix,
            image: self.image,
            score_nutritionnel: self.score_nutritionnel,
            nutriments: self.nutriments,
            poids_unite: self.poids_unite,
            emballage: self.emballage,
            categories: self.categories,
            pays_origine: self.pays_origine,
            fabricant: self.fabricant,
            pays_commercialisation: self.pays_commercialisation,
            distributeur: self.distributeur,
            code_barres: self.code_barres,
            date_peremption: None,
            source: self.source,
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nutriments_accept_bounds() {
        let n = NutrimentData::new(Some(0.0), None, Some(10_000.0), Some(125.0)).unwrap();
        assert_eq!(n.protides(), Some(0.0));
        assert_eq!(n.lipides(), Some(10_000.0));
        assert_eq!(n.calories(), Some(125.0));
        assert!(n.glucides().is_none());
    }

    #[test]
    fn nutriments_reject_out_of_range() {
        let err = NutrimentData::new(None, Some(-1.0), None, None).unwrap_err();
        assert_eq!(
            err,
            CoreError::NutrientOutOfRange {
                field: "glucides",
                value: -1.0
            }
        );
        assert!(NutrimentData::new(None, None, None, Some(10_000.5)).is_err());
        assert!(NutrimentData::new(Some(f64::NAN), None, None, None).is_err());
    }

    #[test]
    fn nutri_score_letters_are_case_insensitive() {
        assert_eq!(NutriScore::from_letter('b'), Some(NutriScore::B));
        assert_eq!(NutriScore::from_letter('E'), Some(NutriScore::E));
        assert_eq!(NutriScore::from_letter('F'), None);
    }

    #[test]
    fn index_prefers_barcode() {
        let record = ProductRecord::builder("https://world.openfoodfacts.org/product/3017620422003")
            .barcode(Some("3017620422003".to_owned()))
            .build()
            .unwrap();
        assert_eq!(record.index(), "3017620422003");
    }

    #[test]
    fn index_falls_back_to_source() {
        let record = ProductRecord::builder("https://example.org/p/1")
            .barcode(Some("   ".to_owned()))
            .build()
            .unwrap();
        assert!(record.barcode().is_none());
        assert_eq!(record.index(), "https://example.org/p/1");
    }

    #[test]
    fn build_fails_without_any_index() {
        let err = ProductRecord::builder("  ").build().unwrap_err();
        assert_eq!(err, CoreError::EmptyIndex);
    }

    #[test]
    fn build_rejects_negative_price() {
        let err = ProductRecord::builder("https://example.org/p/1")
            .price(Some(-2.5))
            .build()
            .unwrap_err();
        assert_eq!(err, CoreError::NegativePrice(-2.5));
    }

    #[test]
    fn empty_lists_are_absent() {
        let record = ProductRecord::builder("https://example.org/p/1")
            .brand_tags(Some(Vec::new()))
            .categories(Some(vec!["Snacks".to_owned()]))
            .build()
            .unwrap();
        assert!(record.brand_tags().is_none());
        assert_eq!(record.categories(), Some(&["Snacks".to_owned()][..]));
    }

    #[test]
    fn serializes_with_downstream_keys() {
        let record = ProductRecord::builder("https://fr.openfoodfacts.org/produit/3017620422003")
            .name(Some("Nutella".to_owned()))
            .quantity(Some("400 g".to_owned()))
            .generic_name(Some("Pâte à tartiner".to_owned()))
            .nutri_score(Some(NutriScore::E))
            .build()
            .unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["nom"], "Nutella");
        assert_eq!(value["nom_générique"], "Pâte à tartiner");
        assert_eq!(value["poids_unité"], "400 g");
        assert_eq!(value["score_nutritionnel"], "E");
        assert!(value["date_peremption"].is_null());
        assert_eq!(
            value["index"],
            "https://fr.openfoodfacts.org/produit/3017620422003"
        );
    }

    #[test]
    fn empty_nutriments_still_emit_all_four_keys() {
        let record = ProductRecord::builder("https://example.org/p/1")
            .build()
            .unwrap();
        let value = serde_json::to_value(&record).unwrap();
        let nutriments = value["nutriments"].as_object().expect("object, not null");
        for key in ["protides", "glucides", "lipides", "calories"] {
            assert!(nutriments.contains_key(key), "missing nutrient key {key}");
            assert!(nutriments[key].is_null());
        }
    }
}

pub mod config;
pub mod product;
pub mod target;

pub use config::{
    build_scrape_config, load_scrape_config_from_env, log_level_from_env, OutputFormat,
    ScrapeConfig,
};
pub use product::{NutriScore, NutrimentData, ProductRecord, ProductRecordBuilder};
pub use target::ScrapeTarget;

use thiserror::Error;

/// Invariant violations raised while assembling a [`ProductRecord`].
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("nutrient {field} out of range [0, 10000]: {value}")]
    NutrientOutOfRange { field: &'static str, value: f64 },

    #[error("price must be a finite non-negative number, got {0}")]
    NegativePrice(f64),

    #[error("product record has no barcode and no source URL to index by")]
    EmptyIndex,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidValue(String),
}

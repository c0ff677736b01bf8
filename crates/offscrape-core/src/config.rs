use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::ConfigError;

pub const DEFAULT_PRIMARY_BASE_URL: &str = "https://world.openfoodfacts.org/product/";
pub const DEFAULT_FALLBACK_BASE_URL: &str = "https://fr.openfoodfacts.org/produit/";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_USER_AGENT: &str = "offscrape/0.1 (+https://world.openfoodfacts.org)";

/// File format written by the record sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Csv,
}

impl OutputFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(ConfigError::InvalidValue(format!(
                "output format must be \"jsonl\" or \"csv\", got \"{other}\""
            ))),
        }
    }
}

/// Runtime settings for one scrape run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeConfig {
    pub output_format: OutputFormat,
    /// Polite delay between targets, in seconds.
    pub delay_secs: f64,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Total fetch attempts per URL, first try included.
    pub max_retries: u32,
    pub output_dir: PathBuf,
    pub primary_base_url: String,
    pub fallback_base_url: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Jsonl,
            delay_secs: 1.0,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            timeout_secs: 30,
            max_retries: 3,
            output_dir: PathBuf::from("out"),
            primary_base_url: DEFAULT_PRIMARY_BASE_URL.to_owned(),
            fallback_base_url: DEFAULT_FALLBACK_BASE_URL.to_owned(),
        }
    }
}

impl ScrapeConfig {
    /// Checks the numeric options. Called once, after CLI flags have been
    /// applied, so a bad value is reported before any network activity.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the delay is negative, not
    /// finite or too large for a `Duration`, the timeout is zero, or
    /// `max_retries` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Duration::try_from_secs_f64(self.delay_secs).is_err() {
            return Err(ConfigError::InvalidValue(format!(
                "delay must be a non-negative number of seconds, got {}",
                self.delay_secs
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("timeout must be positive".to_owned()));
        }
        if self.max_retries < 1 {
            return Err(ConfigError::InvalidValue("max retries must be at least 1".to_owned()));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue("user agent must not be empty".to_owned()));
        }
        Ok(())
    }

    /// The polite delay as a `Duration`. Values [`Self::validate`] rejects map
    /// to zero.
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_secs).unwrap_or_default()
    }
}

/// Log filter directive from `OFFSCRAPE_LOG_LEVEL`, `info` when unset.
#[must_use]
pub fn log_level_from_env() -> String {
    std::env::var("OFFSCRAPE_LOG_LEVEL").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_owned())
}

/// Load scrape configuration from environment variables already in the process.
///
/// The result is not validated; callers apply their overrides first and then
/// call [`ScrapeConfig::validate`].
///
/// # Errors
///
/// Returns `ConfigError` if values are unparseable.
pub fn load_scrape_config_from_env() -> Result<ScrapeConfig, ConfigError> {
    build_scrape_config(|key| std::env::var(key))
}

/// Build scrape configuration using the provided env-var lookup function.
///
/// Every variable is optional; unset variables take the defaults of
/// [`ScrapeConfig::default`].
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for unparseable values. Range
/// checks are left to [`ScrapeConfig::validate`].
pub fn build_scrape_config<F>(lookup: F) -> Result<ScrapeConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = ScrapeConfig::default();

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: u32| -> Result<u32, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.trim().parse::<u32>().map_err(|e| invalid(var, e.to_string())),
            Err(_) => Ok(default),
        }
    };

    let parse_u64 = |var: &str, default: u64| -> Result<u64, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|e| invalid(var, e.to_string())),
            Err(_) => Ok(default),
        }
    };

    let parse_f64 = |var: &str, default: f64| -> Result<f64, ConfigError> {
        match lookup(var) {
            Ok(raw) => raw.trim().parse::<f64>().map_err(|e| invalid(var, e.to_string())),
            Err(_) => Ok(default),
        }
    };

    let output_format = match lookup("OFFSCRAPE_OUTPUT_FORMAT") {
        Ok(raw) => raw
            .parse::<OutputFormat>()
            .map_err(|e| invalid("OFFSCRAPE_OUTPUT_FORMAT", e.to_string()))?,
        Err(_) => defaults.output_format,
    };

    Ok(ScrapeConfig {
        output_format,
        delay_secs: parse_f64("OFFSCRAPE_DELAY_SECS", defaults.delay_secs)?,
        user_agent: or_default("OFFSCRAPE_USER_AGENT", &defaults.user_agent),
        timeout_secs: parse_u64("OFFSCRAPE_TIMEOUT_SECS", defaults.timeout_secs)?,
        max_retries: parse_u32("OFFSCRAPE_MAX_RETRIES", defaults.max_retries)?,
        output_dir: PathBuf::from(or_default(
            "OFFSCRAPE_OUTPUT_DIR",
            &defaults.output_dir.to_string_lossy(),
        )),
        primary_base_url: or_default("OFFSCRAPE_PRIMARY_BASE_URL", &defaults.primary_base_url),
        fallback_base_url: or_default("OFFSCRAPE_FALLBACK_BASE_URL", &defaults.fallback_base_url),
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

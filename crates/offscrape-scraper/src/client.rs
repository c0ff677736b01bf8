use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Client;

use crate::error::ScraperError;
use crate::retry::{retry_with_backoff, RetryPolicy};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml";
/// Tuned for the French fallback locale.
const ACCEPT_LANGUAGE_FR: &str = "fr,fr-FR;q=0.9,en;q=0.8";
const MAX_REDIRECTS: usize = 10;

/// A fetched page: the body and the URL it was finally served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub html: String,
    /// Post-redirect URL. Used for barcode recovery and record provenance.
    pub final_url: String,
}

/// Settings for [`ProductPageClient`].
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl FetchSettings {
    #[must_use]
    pub fn from_config(config: &offscrape_core::ScrapeConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            retry: RetryPolicy::with_max_attempts(config.max_retries),
        }
    }
}

/// HTTP client for product pages.
///
/// Sends a fixed browser-like header set, follows redirects, and rejects
/// anything that is not HTML. Transport failures (network errors and non-2xx
/// statuses) are retried according to the configured [`RetryPolicy`].
pub struct ProductPageClient {
    client: Client,
    retry: RetryPolicy,
}

impl ProductPageClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., a user agent with invalid header bytes).
    pub fn new(settings: FetchSettings) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_FR));

        let client = Client::builder()
            .timeout(settings.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self {
            client,
            retry: settings.retry,
        })
    }

    /// Fetches one page, retrying transport failures.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Http`] — network, DNS or timeout failure after all
    ///   attempts.
    /// - [`ScraperError::UnexpectedStatus`] — non-2xx status after all
    ///   attempts.
    /// - [`ScraperError::ContentType`] — the response is not HTML (not retried).
    pub async fn fetch(&self, url: &str) -> Result<FetchOutcome, ScraperError> {
        retry_with_backoff(&self.retry, url, |attempt| async move {
            tracing::debug!(url, attempt, "fetching page");
            self.fetch_once(url).await
        })
        .await
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchOutcome, ScraperError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: final_url,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        if !is_html_content_type(&content_type) {
            return Err(ScraperError::ContentType {
                content_type: if content_type.is_empty() {
                    "<missing>".to_owned()
                } else {
                    content_type
                },
                url: final_url,
            });
        }

        let html = response.text().await?;
        Ok(FetchOutcome { html, final_url })
    }
}

fn is_html_content_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    lower.contains("text/html") || lower.contains("application/xhtml+xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_content_types_are_accepted() {
        assert!(is_html_content_type("text/html"));
        assert!(is_html_content_type("text/html; charset=utf-8"));
        assert!(is_html_content_type("Text/HTML"));
        assert!(is_html_content_type("application/xhtml+xml"));
    }

    #[test]
    fn non_html_content_types_are_rejected() {
        assert!(!is_html_content_type(""));
        assert!(!is_html_content_type("application/json"));
        assert!(!is_html_content_type("image/png"));
    }

    #[test]
    fn settings_from_config_carry_attempt_budget() {
        let config = offscrape_core::ScrapeConfig {
            max_retries: 5,
            timeout_secs: 12,
            ..offscrape_core::ScrapeConfig::default()
        };
        let settings = FetchSettings::from_config(&config);
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.timeout, Duration::from_secs(12));
        assert_eq!(settings.user_agent, config.user_agent);
    }
}

//! HTTP client for the register's paginated search endpoint.

mod fetch_all;

use std::time::Duration;

use psireg_core::{AppConfig, EntityKind};
use reqwest::{Client, Url};

use crate::error::ScraperError;
use crate::rate_limit::retry_with_backoff;

/// Request and concurrency settings for a [`RegisterClient`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Upper bound on page requests in flight at once.
    pub max_concurrent: usize,
    /// Additional attempts after the first failure for transient errors.
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl From<&AppConfig> for FetchOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            max_concurrent: config.max_concurrent_requests,
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        }
    }
}

/// Client for the register search endpoint.
///
/// One client is built per run. Its `reqwest::Client` is shared by every
/// concurrent page request, and `max_concurrent` caps how many of those are
/// in flight at once.
pub struct RegisterClient {
    client: Client,
    base_url: Url,
    max_concurrent: usize,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl RegisterClient {
    /// Creates a client pointed at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if `base_url` does not parse,
    /// or [`ScraperError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(base_url: &str, options: &FetchOptions) -> Result<Self, ScraperError> {
        let base_url = Url::parse(base_url).map_err(|e| ScraperError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(options.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url,
            max_concurrent: options.max_concurrent.max(1),
            max_retries: options.max_retries,
            backoff_base_ms: options.backoff_base_ms,
        })
    }

    /// Creates a client from the application configuration.
    ///
    /// # Errors
    ///
    /// See [`RegisterClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(&config.base_url, &FetchOptions::from(config))
    }

    /// Fetches one results page, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status
    ///   (5xx retried, 4xx not).
    /// - [`ScraperError::Http`]: network or TLS failure after all retries.
    pub async fn fetch_page(&self, kind: EntityKind, page: u32) -> Result<String, ScraperError> {
        let url = self.page_url(kind, page);

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url.clone())
                    .header(reqwest::header::ACCEPT, "text/html,*/*;q=0.8")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ScraperError::RateLimited {
                        page,
                        retry_after_secs,
                    });
                }

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                Ok(response.text().await?)
            }
        })
        .await
    }

    /// Builds `{base_url}?type={kind}&page={page}`.
    fn page_url(&self, kind: EntityKind, page: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("type", &kind.query_value().to_string())
            .append_pair("page", &page.to_string());
        url
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;

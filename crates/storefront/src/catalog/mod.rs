//! Public catalog API client.
//!
//! # Endpoints
//!
//! - `GET {base}/products`
//! - `GET {base}/products/categories`
//! - `GET {base}/products/category/{name}`
//!
//! Every request is retried once after [`RETRY_DELAY`] when it fails at the
//! transport level or the server answers 5xx. The client never substitutes
//! data itself; degrading to [`fallback::sample_products`] is the catalog
//! service's decision.

pub mod fallback;

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use fakestore_core::Product;

use crate::config::CatalogConfig;

/// Pause before the single retry.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

const USER_AGENT: &str = concat!("fakestore/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when calling the catalog API.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("catalog returned HTTP {status}")]
    Status { status: u16, body: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot carry endpoint paths.
    #[error("invalid catalog base url: {0}")]
    InvalidBaseUrl(String),
}

impl CatalogError {
    /// Transport-level failure: connect, timeout or request error.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout() || e.is_connect() || e.is_request())
    }

    /// Whether the request is worth repeating.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.is_network() || matches!(self, Self::Status { status, .. } if *status >= 500)
    }
}

/// Client for the public catalog API.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
    retry_delay: Duration,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Http` if the HTTP client cannot be built.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
            retry_delay: RETRY_DELAY,
        })
    }

    /// Override the pause before the retry.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// All products.
    ///
    /// # Errors
    ///
    /// Returns an error if both attempts fail or the body does not parse.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, CatalogError> {
        let url = self.endpoint(&["products"])?;
        self.get_json(url).await
    }

    /// Category names as published by the API.
    ///
    /// # Errors
    ///
    /// Returns an error if both attempts fail or the body does not parse.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<String>, CatalogError> {
        let url = self.endpoint(&["products", "categories"])?;
        self.get_json(url).await
    }

    /// Products in one category, filtered server-side.
    ///
    /// # Errors
    ///
    /// Returns an error if both attempts fail or the body does not parse.
    #[instrument(skip(self))]
    pub async fn products_in_category(&self, category: &str) -> Result<Vec<Product>, CatalogError> {
        let url = self.endpoint(&["products", "category", category])?;
        self.get_json(url).await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidBaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, CatalogError> {
        match self.fetch(&url).await {
            Err(e) if e.is_retryable() => {
                warn!(
                    url = %url,
                    error = %e,
                    delay_ms = u64::try_from(self.retry_delay.as_millis()).unwrap_or(u64::MAX),
                    "Catalog request failed, retrying once"
                );
                tokio::time::sleep(self.retry_delay).await;
                self.fetch(&url).await
            }
            result => result,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &Url) -> Result<T, CatalogError> {
        debug!(url = %url, "Fetching from catalog");
        let response = self.inner.client.get(url.clone()).send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse catalog response"
            );
            CatalogError::Parse(e)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> CatalogClient {
        let config = CatalogConfig {
            base_url: Url::parse(base).unwrap(),
            ..CatalogConfig::default()
        };
        CatalogClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_paths() {
        let c = client("https://fakestoreapi.com");
        assert_eq!(
            c.endpoint(&["products"]).unwrap().as_str(),
            "https://fakestoreapi.com/products"
        );

        let c = client("http://127.0.0.1:8080/api/");
        assert_eq!(
            c.endpoint(&["products", "category", "men's clothing"])
                .unwrap()
                .as_str(),
            "http://127.0.0.1:8080/api/products/category/men's%20clothing"
        );
    }

    #[test]
    fn test_retry_classification() {
        let server_error = CatalogError::Status {
            status: 503,
            body: String::new(),
        };
        assert!(server_error.is_retryable());
        assert!(!server_error.is_network());

        let not_found = CatalogError::Status {
            status: 404,
            body: String::new(),
        };
        assert!(!not_found.is_retryable());

        let parse = CatalogError::Parse(serde_json::from_str::<u8>("x").unwrap_err());
        assert!(!parse.is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let c = client("http://127.0.0.1:1").with_retry_delay(Duration::from_millis(1));
        let err = c.products().await.unwrap_err();
        assert!(err.is_network());
    }
}

//! Search executor: the sole network egress point for discovery.
//!
//! Every fetch (Google result pages and job detail pages) goes out through
//! the scraping proxy and the shared [`Throttle`]. One bad query is logged
//! and skipped by the caller; it never aborts the run.

use std::sync::Arc;

use rquest::Client;
use url::Url;

use crate::config::{credential_from_env, SCRAPERAPI_KEY_VAR};
use crate::error::{AppError, Result};
use crate::service::http::{create_client, ClientType};
use crate::service::query_builder::SearchQuery;
use crate::service::throttle::Throttle;

const PROXY_ENDPOINT: &str = "https://api.scraperapi.com/";

pub struct SearchExecutor {
    client: Client,
    api_key: String,
    endpoint: String,
    throttle: Arc<Throttle>,
}

impl SearchExecutor {
    /// Fails with a configuration error before any request is made if the
    /// proxy credential is missing.
    pub fn from_env(throttle: Arc<Throttle>) -> Result<Self> {
        let api_key = credential_from_env(SCRAPERAPI_KEY_VAR)?;
        Self::new(api_key, throttle)
    }

    pub fn new(api_key: String, throttle: Arc<Throttle>) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::config("scraping proxy API key is empty"));
        }
        Ok(Self {
            client: create_client(ClientType::HeavyEmulation)?,
            api_key,
            endpoint: PROXY_ENDPOINT.to_string(),
            throttle,
        })
    }

    /// Point the executor at a different proxy endpoint (tests use a mock
    /// server here).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Run one search query and return the raw result payload.
    pub async fn search(&self, query: &SearchQuery) -> Result<String> {
        log::info!("[SEARCH] Running query: {}", query.label());
        self.fetch_page(&query.google_url()).await
    }

    /// Fetch an arbitrary page through the proxy and throttle. Used for
    /// job detail pages as well as search result pages.
    pub async fn fetch_page(&self, target_url: &str) -> Result<String> {
        let proxied = self.proxy_url(target_url)?;

        self.throttle.wait().await;

        log::debug!("[SEARCH] Fetching {}", target_url);
        let response = self
            .client
            .get(proxied)
            .send()
            .await
            .map_err(|e| AppError::fetch(format!("request to {} failed: {}", target_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(format!(
                "{} returned status {}",
                target_url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::fetch(format!("failed to read body of {}: {}", target_url, e)))?;

        log::trace!("[SEARCH] Received {} bytes from {}", body.len(), target_url);
        Ok(body)
    }

    fn proxy_url(&self, target_url: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[("api_key", self.api_key.as_str()), ("url", target_url)],
        )
        .map_err(|e| AppError::fetch(format!("invalid proxy endpoint: {}", e)))?;
        Ok(url.to_string())
    }
}

//! Rate-limited, retrying HTTP client for the upstream API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::limiter::RequestLimiter;
use super::query::{build_query, QueryDefaults, RequestParams};
use super::response::{classify, ApiResponse, PaginationMeta};
use super::retry::{run_with_retry, RetryPolicy};
use crate::config::Config;
use crate::entity::EntityId;
use crate::error::FetchError;

/// Default per-attempt timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default request budget
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 10;

/// One page of a paginated collection.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Value>,
    pub pagination: Option<PaginationMeta>,
}

/// HTTP client shared by every upstream call.
///
/// Clones share the connection pool and the rate limiter.
#[derive(Debug, Clone)]
pub struct TransportClient {
    http: reqwest::Client,
    base_url: String,
    defaults: QueryDefaults,
    limiter: RequestLimiter,
    retry: RetryPolicy,
}

impl TransportClient {
    /// Client with default language, budget, retry policy and timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            defaults: QueryDefaults::default(),
            limiter: RequestLimiter::per_second(DEFAULT_REQUESTS_PER_SECOND),
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let mut client = Self::new(config.api_base_url.clone())?
            .with_http_client(http)
            .with_lang(config.api_lang.clone())
            .with_rate_limit(config.requests_per_second)
            .with_retry_policy(config.retry_policy());
        if let Some(key) = &config.api_key {
            client = client.with_access_token(key.clone());
        }
        if let Some(version) = &config.api_schema_version {
            client = client.with_schema_version(version.clone());
        }
        Ok(client)
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.defaults.lang = lang.into();
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.defaults.access_token = Some(token.into());
        self
    }

    pub fn with_schema_version(mut self, version: impl Into<String>) -> Self {
        self.defaults.schema_version = Some(version.into());
        self
    }

    /// Replaces the limiter; `0` disables limiting.
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.limiter = RequestLimiter::per_second(requests_per_second);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Sends a GET to `endpoint`, retrying per the policy.
    ///
    /// Invalid parameters fail before anything is sent. Every attempt waits
    /// for a rate-limit token first.
    pub async fn execute(
        &self,
        endpoint: &str,
        params: &RequestParams,
    ) -> Result<ApiResponse, FetchError> {
        let query = build_query(&self.defaults, params)?;
        let url = self.url_for(endpoint);

        run_with_retry(&self.retry, |attempt| self.attempt(&url, &query, attempt)).await
    }

    /// Like [`execute`](Self::execute) but gives up with
    /// [`FetchError::Cancelled`] once `deadline` passes, even mid-backoff.
    pub async fn execute_until(
        &self,
        endpoint: &str,
        params: &RequestParams,
        deadline: Instant,
    ) -> Result<ApiResponse, FetchError> {
        match tokio::time::timeout_at(deadline, self.execute(endpoint, params)).await {
            Ok(result) => result,
            Err(_) => {
                debug!("Request to {} cancelled at deadline", endpoint);
                Err(FetchError::Cancelled)
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        query: &[(&'static str, String)],
        attempt: u32,
    ) -> Result<ApiResponse, FetchError> {
        self.limiter.acquire().await;
        debug!("HTTP request to {} (attempt {})", url, attempt + 1);

        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(send_error)?;
        let status = response.status().as_u16();
        trace!("Response status: {}", status);

        let pagination = PaginationMeta::from_headers(response.headers());
        let body = response.bytes().await?.to_vec();
        let body = classify(status, body)?;

        Ok(ApiResponse {
            status,
            body,
            pagination,
        })
    }

    /// Executes and decodes the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &RequestParams,
    ) -> Result<T, FetchError> {
        self.execute(endpoint, params).await?.json()
    }

    /// Every ID the collection endpoint advertises.
    pub async fn fetch_all_ids(&self, endpoint: &str) -> Result<Vec<EntityId>, FetchError> {
        self.get_json(endpoint, &RequestParams::default()).await
    }

    /// One page of full records.
    pub async fn fetch_page(
        &self,
        endpoint: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page, FetchError> {
        let response = self
            .execute(endpoint, &RequestParams::page(page, page_size))
            .await?;
        Ok(Page {
            items: response.json()?,
            pagination: response.pagination,
        })
    }
}

/// A request that could not be built (bad URL, bad header) was never sent.
fn send_error(e: reqwest::Error) -> FetchError {
    if e.is_builder() {
        FetchError::InvalidRequest(e.to_string())
    } else {
        FetchError::Transport(e)
    }
}

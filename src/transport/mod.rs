//! Upstream API transport
//!
//! Query construction, response classification, rate limiting and retry.

mod client;
mod fetcher;
mod limiter;
mod query;
mod response;
mod retry;

pub use client::{Page, TransportClient, DEFAULT_REQUESTS_PER_SECOND, DEFAULT_TIMEOUT};
pub use fetcher::EntityFetcher;
pub use limiter::RequestLimiter;
pub use query::{build_query, IdSelector, QueryDefaults, RequestParams, CREDENTIAL_PARAM, MAX_PAGE_SIZE};
pub use response::{classify, ApiResponse, PaginationMeta};
pub use retry::{run_with_retry, RetryPolicy};

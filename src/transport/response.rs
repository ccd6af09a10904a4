//! Response classification and pagination metadata.

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Pagination headers returned by collection endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub page_total: Option<u32>,
    pub result_total: Option<u32>,
}

impl PaginationMeta {
    /// Reads `X-Page*` / `X-Result-Total`; `None` when none of them is present.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u32>().ok())
        };

        let meta = Self {
            page: read("x-page"),
            page_size: read("x-page-size"),
            page_total: read("x-page-total"),
            result_total: read("x-result-total"),
        };

        (meta != Self::default()).then_some(meta)
    }
}

/// Successful response body plus metadata.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub pagination: Option<PaginationMeta>,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    text: String,
}

/// 200 and 206 are success; anything else becomes an `Api` error when the
/// body is `{"text": ...}` and an `HttpStatus` error otherwise.
pub fn classify(status: u16, body: Vec<u8>) -> Result<Vec<u8>, FetchError> {
    if status == 200 || status == 206 {
        return Ok(body);
    }

    match serde_json::from_slice::<ApiErrorBody>(&body) {
        Ok(err) => Err(FetchError::Api {
            status,
            text: err.text,
        }),
        Err(_) => Err(FetchError::HttpStatus {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        }),
    }
}

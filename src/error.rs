//! Error types for the bulk cache
//!
//! `FetchError` covers everything the transport can surface; `Error` is the
//! crate-level type handed to consumers and rendered by the HTTP layer.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::entity::EntityKind;
use crate::models::ErrorResponse;

// == Fetch Error Enum ==
/// Failures raised while talking to the remote API.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network failure, timeout or connection reset
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status without a structured error body
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Structured `{"text": ...}` error from the upstream service
    #[error("API error ({status}): {text}")]
    Api { status: u16, text: String },

    /// Request rejected before it was sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Caller deadline elapsed before the request completed
    #[error("Request cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether another attempt may succeed.
    ///
    /// Server errors, rate limiting and transport failures are retryable.
    /// Other 4xx responses, local validation failures and requests that
    /// could not be built are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(e) => !e.is_builder(),
            FetchError::HttpStatus { status, .. } | FetchError::Api { status, .. } => {
                is_retryable_status(*status)
            }
            FetchError::InvalidRequest(_) | FetchError::Decode(_) | FetchError::Cancelled => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus { status, .. } | FetchError::Api { status, .. } => {
                Some(*status)
            }
            FetchError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// 5xx and 429 are worth retrying.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

// == Crate Error Enum ==
/// Unified error type for cache, registry and service operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Network fetch failed and no cached data could stand in
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A snapshot file could not be opened or read
    #[error("Failed to load snapshot {path}: {source}")]
    SnapshotLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more kinds failed to load from a snapshot directory
    #[error("{} snapshot(s) failed to load", .0.len())]
    SnapshotLoads(Vec<Error>),

    /// Writing an exported snapshot failed
    #[error("Export write failed: {0}")]
    ExportWrite(#[from] std::io::Error),

    /// Operation requires a warmed cache
    #[error("Cache for {0} has not been loaded")]
    NotLoaded(EntityKind),

    /// Path segment did not name a known entity kind
    #[error("Unknown entity kind: {0}")]
    UnknownKind(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound(_) | Error::UnknownKind(_) => StatusCode::NOT_FOUND,
            Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Error::NotLoaded(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Fetch(FetchError::Api { status, .. })
            | Error::Fetch(FetchError::HttpStatus { status, .. })
                if (400..500).contains(status) =>
            {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Error::Fetch(FetchError::Cancelled) => StatusCode::GATEWAY_TIMEOUT,
            Error::Fetch(_) => StatusCode::BAD_GATEWAY,
            Error::SnapshotLoad { .. } | Error::SnapshotLoads(_) | Error::ExportWrite(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

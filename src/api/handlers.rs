//! API Handlers
//!
//! HTTP request handlers for each lookup endpoint. Successful, complete
//! responses are memoized in the response cache keyed by request URI.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::entity::{EntityId, EntityKind, EntityStore, Record};
use crate::error::{Error, Result};
use crate::models::{HealthResponse, IdsQuery, RecipeLookup, RecipeQuery, StatsResponse};
use crate::service::{DataService, SearchFilter};

/// Set to `true` when some requested records could not be fetched.
pub const PARTIAL_RESULT_HEADER: &str = "x-partial-result";
/// `hit` when the body came from the response cache, `miss` otherwise.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: DataService,
    pub response_cache: Arc<ResponseCache<Value>>,
}

impl AppState {
    pub fn new(service: DataService, response_cache: Arc<ResponseCache<Value>>) -> Self {
        Self {
            service,
            response_cache,
        }
    }

    /// Builds the response cache from configuration; starts its sweep.
    pub fn from_config(config: &Config, service: DataService) -> Self {
        let response_cache = ResponseCache::new(
            config.max_entries,
            config.default_ttl(),
            config.cleanup_interval(),
        );
        Self::new(service, Arc::new(response_cache))
    }
}

fn cache_key(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

fn json_response(value: Value, cache_status: &'static str) -> Response {
    let mut response = Json(value).into_response();
    response
        .headers_mut()
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(cache_status));
    response
}

/// Memoizes `value` unless it is partial, then renders it.
async fn respond(state: &AppState, key: String, value: Value, partial: bool) -> Response {
    if partial {
        let mut response = json_response(value, "miss");
        response
            .headers_mut()
            .insert(PARTIAL_RESULT_HEADER, HeaderValue::from_static("true"));
        return response;
    }
    state.response_cache.set(key, value.clone(), None).await;
    json_response(value, "miss")
}

async fn cached(state: &AppState, key: &str) -> Option<Response> {
    state
        .response_cache
        .get(key)
        .await
        .map(|value| json_response(value, "hit"))
}

fn records_value(records: Vec<Record>) -> Value {
    Value::Array(records.into_iter().map(Record::into_body).collect())
}

/// Handler for `GET /v2/:kind`
///
/// Lists every ID, or with `?ids=` returns those records in request order.
pub async fn list_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<IdsQuery>,
    uri: Uri,
) -> Result<Response> {
    let kind: EntityKind = kind.parse()?;
    let ids = query.parsed()?;
    let key = cache_key(&uri);
    if let Some(hit) = cached(&state, &key).await {
        return Ok(hit);
    }

    match ids {
        Some(ids) => {
            let resolved = state.service.get_by_ids(kind, &ids).await?;
            let partial = resolved.is_partial();
            Ok(respond(&state, key, records_value(resolved.records), partial).await)
        }
        None => {
            let ids = state.service.list_ids(kind).await?;
            let value = Value::Array(ids.into_iter().map(Value::from).collect());
            Ok(respond(&state, key, value, false).await)
        }
    }
}

/// Handler for `GET /v2/:kind/:id`
pub async fn get_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    uri: Uri,
) -> Result<Response> {
    let kind: EntityKind = kind.parse()?;
    let key = cache_key(&uri);
    if let Some(hit) = cached(&state, &key).await {
        return Ok(hit);
    }

    let id = EntityId::from_text(&id);
    let record = state
        .service
        .get_by_id(kind, &id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{kind} {id}")))?;

    Ok(respond(&state, key, record.into_body(), false).await)
}

/// Handler for `GET /search/:kind`
///
/// Scans the loaded snapshot; `503` when the kind has never been loaded.
pub async fn search_handler(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(filter): Query<SearchFilter>,
    uri: Uri,
) -> Result<Response> {
    let kind: EntityKind = kind.parse()?;
    let key = cache_key(&uri);
    if let Some(hit) = cached(&state, &key).await {
        return Ok(hit);
    }

    let records = state.service.search(kind, &filter)?;
    Ok(respond(&state, key, records_value(records), false).await)
}

/// Handler for `GET /recipes/search?output=<item>` or `?input=<item>`
pub async fn recipes_handler(
    State(state): State<AppState>,
    Query(query): Query<RecipeQuery>,
    uri: Uri,
) -> Result<Response> {
    let lookup = query.validate()?;
    let key = cache_key(&uri);
    if let Some(hit) = cached(&state, &key).await {
        return Ok(hit);
    }

    let records = match &lookup {
        RecipeLookup::Output(item) => state.service.recipes_by_output(item)?,
        RecipeLookup::Input(item) => state.service.recipes_by_ingredient(item)?,
    };
    Ok(respond(&state, key, records_value(records), false).await)
}

/// Handler for `GET /stats`
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        response_cache: state.response_cache.stats().await,
        entities: state.service.registry().stats(),
    })
}

/// Handler for `GET /health`
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.service.registry();
    let loaded = EntityKind::ALL
        .into_iter()
        .filter(|kind| registry.cache(*kind).is_loaded())
        .collect();
    Json(HealthResponse::healthy(loaded))
}

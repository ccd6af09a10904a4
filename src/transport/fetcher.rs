//! The seam between bulk resolution and the network.

use async_trait::async_trait;

use super::client::TransportClient;
use super::query::RequestParams;
use crate::entity::EntityId;
use crate::error::FetchError;

/// Fetches entity data in bulk.
///
/// Returns raw bodies so callers decode into whatever entity type they hold.
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    /// One request for all of `ids`; the body is an array or a single object.
    async fn fetch_by_ids(&self, endpoint: &str, ids: &[EntityId]) -> Result<Vec<u8>, FetchError>;

    /// The endpoint's full ID list.
    async fn fetch_ids(&self, endpoint: &str) -> Result<Vec<EntityId>, FetchError>;
}

#[async_trait]
impl EntityFetcher for TransportClient {
    async fn fetch_by_ids(&self, endpoint: &str, ids: &[EntityId]) -> Result<Vec<u8>, FetchError> {
        let response = self.execute(endpoint, &RequestParams::ids(ids)).await?;
        Ok(response.body)
    }

    async fn fetch_ids(&self, endpoint: &str) -> Result<Vec<EntityId>, FetchError> {
        self.fetch_all_ids(endpoint).await
    }
}

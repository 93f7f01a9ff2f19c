//! Shared handler helpers.

use crate::error::{ApiError, ApiResult};
use axum::extract::Request;
use folio_core::{CollectionType, ItemId};
use serde::de::DeserializeOwned;

/// Read and deserialize a JSON request body of at most `limit` bytes.
pub async fn read_json<T: DeserializeOwned>(req: Request, limit: usize) -> ApiResult<T> {
    let bytes = axum::body::to_bytes(req.into_body(), limit)
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::BadRequest(format!("invalid JSON: {e}")))
}

/// Resolve the `{collection}` path segment.
pub fn parse_collection(slug: &str) -> ApiResult<CollectionType> {
    Ok(CollectionType::from_slug(slug)?)
}

/// Parse the `{id}` path segment.
pub fn parse_item_id(raw: &str) -> ApiResult<ItemId> {
    match raw.parse::<ItemId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::BadRequest(format!("invalid item id: {raw}"))),
    }
}

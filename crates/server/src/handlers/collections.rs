//! Ordered collection endpoints.

use crate::auth::{get_trace_id, require_auth};
use crate::error::{ApiError, ApiResult};
use crate::handlers::common::{parse_collection, parse_item_id, read_json};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use folio_core::{EntityPayload, MAX_POSITION, Position};
use folio_store::CollectionEntry;
use serde::Deserialize;
use serde_json::Value;

/// Body of a reorder request.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    /// Target 1-based position.
    pub new_index: Position,
}

impl ReorderRequest {
    fn validate(&self) -> ApiResult<()> {
        if !(1..=MAX_POSITION).contains(&self.new_index) {
            return Err(ApiError::BadRequest(format!(
                "new_index must be between 1 and {MAX_POSITION}"
            )));
        }
        Ok(())
    }
}

/// GET /v1/portfolio/{collection} - List items in display order.
pub async fn list_items(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    req: Request,
) -> ApiResult<Json<Vec<CollectionEntry>>> {
    let owner = require_auth(&req)?.owner.clone();
    let collection = parse_collection(&collection)?;

    let entries = state.collections.list(&owner, collection).await?;
    Ok(Json(entries))
}

/// GET /v1/portfolio/public/{slug}/{collection} - Read-only listing for visitors.
///
/// No token is required; the slug selects whose portfolio is shown.
pub async fn list_public_items(
    State(state): State<AppState>,
    Path((slug, collection)): Path<(String, String)>,
) -> ApiResult<Json<Vec<CollectionEntry>>> {
    let collection = parse_collection(&collection)?;
    let entries = state.collections.list_public(&slug, collection).await?;
    Ok(Json(entries))
}

/// POST /v1/portfolio/{collection} - Append a new item.
pub async fn create_item(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    req: Request,
) -> ApiResult<(StatusCode, Json<CollectionEntry>)> {
    let owner = require_auth(&req)?.owner.clone();
    let trace_id = get_trace_id(&req).cloned().unwrap_or_default();
    let collection = parse_collection(&collection)?;

    let body: Value = read_json(req, state.config.server.max_body_bytes).await?;
    let payload = EntityPayload::parse(collection, body)?;

    let entry = state.collections.create(&owner, &payload).await?;
    tracing::debug!(
        trace_id = %trace_id,
        item_id = entry.item.id,
        "Item appended"
    );
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /v1/portfolio/{collection}/{id} - Fetch one item.
pub async fn get_item(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    req: Request,
) -> ApiResult<Json<CollectionEntry>> {
    let owner = require_auth(&req)?.owner.clone();
    let collection = parse_collection(&collection)?;
    let id = parse_item_id(&id)?;

    let entry = state.collections.get(&owner, collection, id).await?;
    Ok(Json(entry))
}

/// PUT /v1/portfolio/{collection}/{id} - Replace an item's payload.
///
/// Position is unchanged. For the work gallery the submitted attachment
/// list is reconciled against the stored one by URL.
pub async fn update_item(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    req: Request,
) -> ApiResult<Json<CollectionEntry>> {
    let owner = require_auth(&req)?.owner.clone();
    let collection = parse_collection(&collection)?;
    let id = parse_item_id(&id)?;

    let body: Value = read_json(req, state.config.server.max_body_bytes).await?;
    let payload = EntityPayload::parse(collection, body)?;

    let entry = state.collections.update(&owner, id, &payload).await?;
    Ok(Json(entry))
}

/// DELETE /v1/portfolio/{collection}/{id} - Remove an item and close the gap.
pub async fn delete_item(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    req: Request,
) -> ApiResult<StatusCode> {
    let owner = require_auth(&req)?.owner.clone();
    let collection = parse_collection(&collection)?;
    let id = parse_item_id(&id)?;

    state.collections.remove(&owner, collection, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /v1/portfolio/{collection}/{id}/reorder - Move an item.
pub async fn reorder_item(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    req: Request,
) -> ApiResult<StatusCode> {
    let owner = require_auth(&req)?.owner.clone();
    let collection = parse_collection(&collection)?;
    let id = parse_item_id(&id)?;

    let body: ReorderRequest = read_json(req, state.config.server.max_body_bytes).await?;
    body.validate()?;

    state
        .collections
        .move_item(&owner, collection, id, body.new_index)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

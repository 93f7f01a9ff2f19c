//! Collection metadata endpoints.

use crate::auth::require_auth;
use crate::error::ApiResult;
use crate::handlers::common::{parse_collection, read_json};
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Request, State};
use folio_core::{CollectionMetadata, CollectionType};
use serde::Serialize;

/// Metadata of one collection; `metadata` is null until first set.
#[derive(Debug, Serialize)]
pub struct MetadataResponse {
    pub collection: CollectionType,
    pub metadata: Option<CollectionMetadata>,
}

/// GET /v1/portfolio/{collection}/metadata
pub async fn get_metadata(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    req: Request,
) -> ApiResult<Json<MetadataResponse>> {
    let owner = require_auth(&req)?.owner.clone();
    let collection = parse_collection(&collection)?;

    let metadata = state
        .collections
        .get_metadata(&owner, collection)
        .await?;
    Ok(Json(MetadataResponse {
        collection,
        metadata,
    }))
}

/// PUT /v1/portfolio/{collection}/metadata - Overwrite heading and description.
pub async fn put_metadata(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    req: Request,
) -> ApiResult<Json<MetadataResponse>> {
    let owner = require_auth(&req)?.owner.clone();
    let collection = parse_collection(&collection)?;

    let body: CollectionMetadata = read_json(req, state.config.server.max_body_bytes).await?;
    body.validate()?;

    state
        .collections
        .set_metadata(&owner, collection, &body)
        .await?;
    Ok(Json(MetadataResponse {
        collection,
        metadata: Some(body),
    }))
}

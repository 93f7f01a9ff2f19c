//! Profile endpoints.

use crate::auth::require_auth;
use crate::error::ApiResult;
use crate::handlers::common::read_json;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Request, State};
use folio_core::validate;
use folio_store::{Profile, ProfileUpdate};
use serde::Deserialize;

/// Body of a profile upsert.
#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Public handle; omitting it unpublishes the portfolio.
    #[serde(default)]
    pub slug: Option<String>,
}

impl ProfileRequest {
    fn validate(&self) -> folio_core::Result<()> {
        validate::email("email", &self.email)?;
        if let Some(name) = &self.full_name {
            validate::length("full_name", name, 1, 100)?;
        }
        if let Some(slug) = &self.slug {
            validate::slug("slug", slug)?;
        }
        validate::optional_url("avatar_url", self.avatar_url.as_deref())
    }

    fn into_update(self) -> ProfileUpdate {
        ProfileUpdate {
            email: self.email,
            full_name: self.full_name,
            avatar_url: self.avatar_url.filter(|u| !u.is_empty()),
            slug: self.slug,
        }
    }
}

/// GET /v1/profile
pub async fn get_profile(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<Json<Profile>> {
    let owner = require_auth(&req)?.owner.clone();
    let profile = state.collections.get_profile(&owner).await?;
    Ok(Json(profile))
}

/// PUT /v1/profile - Create or update the caller's profile.
///
/// Collection metadata stored on the profile is left untouched.
pub async fn put_profile(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<Json<Profile>> {
    let owner = require_auth(&req)?.owner.clone();

    let body: ProfileRequest = read_json(req, state.config.server.max_body_bytes).await?;
    body.validate()?;

    let profile = state
        .collections
        .upsert_profile(&owner, &body.into_update())
        .await?;
    tracing::info!(owner_id = %owner, "Profile saved");
    Ok(Json(profile))
}

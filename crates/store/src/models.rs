//! Database models mapping to the portfolio schema.

use crate::error::StoreResult;
use folio_core::{CollectionType, ItemId, OwnerId, Position};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;

// =============================================================================
// Positioned items
// =============================================================================

/// Raw row of any collection table.
#[derive(Debug, Clone, FromRow)]
pub struct ItemRow {
    pub id: i64,
    pub user_id: String,
    pub order_index: i32,
    pub payload: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl ItemRow {
    pub fn into_item(self, collection: CollectionType) -> StoreResult<PositionedItem> {
        Ok(PositionedItem {
            id: self.id,
            owner_id: OwnerId::parse(&self.user_id)?,
            collection,
            position: self.order_index,
            payload: serde_json::from_str(&self.payload)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// An item of an ordered collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedItem {
    pub id: ItemId,
    pub owner_id: OwnerId,
    #[serde(rename = "collection_type")]
    pub collection: CollectionType,
    #[serde(rename = "order_index")]
    pub position: Position,
    pub payload: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

// =============================================================================
// Attachments
// =============================================================================

/// Persisted attachment.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AttachmentRow {
    pub id: i64,
    #[serde(skip)]
    pub parent_table: String,
    #[serde(skip)]
    pub parent_id: i64,
    #[serde(skip)]
    pub user_id: String,
    pub file_url: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Attachment to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttachment {
    pub parent_table: &'static str,
    pub parent_id: ItemId,
    pub user_id: String,
    pub file_url: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
}

// =============================================================================
// Profiles
// =============================================================================

/// Raw `user_profiles` row; `attributes` is JSON text.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileRow {
    pub user_id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub slug: Option<String>,
    pub attributes: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl ProfileRow {
    pub fn into_profile(self) -> StoreResult<Profile> {
        let attributes = match self.attributes.as_deref() {
            Some(text) => serde_json::from_str(text)?,
            None => Value::Object(Default::default()),
        };
        Ok(Profile {
            user_id: OwnerId::parse(&self.user_id)?,
            email: self.email,
            full_name: self.full_name,
            avatar_url: self.avatar_url,
            slug: self.slug,
            attributes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// A user profile. Collection metadata lives inside `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub user_id: OwnerId,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Public handle used by the unauthenticated portfolio routes.
    pub slug: Option<String>,
    pub attributes: Value,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Columns written by a profile upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub slug: Option<String>,
}

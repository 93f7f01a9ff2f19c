//! Attachment repository.

use crate::error::StoreResult;
use crate::models::{AttachmentRow, NewAttachment};
use async_trait::async_trait;
use folio_core::{ItemId, OwnerId};

/// Repository for attachments owned by positioned items.
#[async_trait]
pub trait AttachmentRepo: Send {
    /// Attachments of one parent, ordered by id.
    async fn list_attachments(
        &mut self,
        owner: &OwnerId,
        parent_table: &str,
        parent_id: ItemId,
    ) -> StoreResult<Vec<AttachmentRow>>;

    /// Attachments of many parents in a single query, ordered by parent then id.
    async fn list_attachments_for_parents(
        &mut self,
        owner: &OwnerId,
        parent_table: &str,
        parent_ids: &[ItemId],
    ) -> StoreResult<Vec<AttachmentRow>>;

    /// Insert attachments in bulk.
    async fn insert_attachments(&mut self, attachments: &[NewAttachment]) -> StoreResult<()>;

    /// Delete attachments by id, scoped to the owner.
    async fn delete_attachments(&mut self, owner: &OwnerId, ids: &[i64]) -> StoreResult<u64>;

    /// Delete every attachment of one parent.
    async fn delete_attachments_for_parent(
        &mut self,
        owner: &OwnerId,
        parent_table: &str,
        parent_id: ItemId,
    ) -> StoreResult<u64>;
}

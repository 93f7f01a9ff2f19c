//! In-memory repositories for unit tests.

use crate::error::StoreResult;
use crate::models::{AttachmentRow, NewAttachment, PositionedItem};
use crate::repos::{AttachmentRepo, PositionRepo};
use async_trait::async_trait;
use folio_core::{CollectionType, ItemId, ListOrder, OwnerId, Position};
use serde_json::Value;
use std::ops::RangeInclusive;
use time::OffsetDateTime;

/// Vec-backed position and attachment repo that counts row writes.
#[derive(Default)]
pub struct MemoryRepo {
    items: Vec<PositionedItem>,
    attachments: Vec<AttachmentRow>,
    next_id: i64,
    writes: usize,
}

impl MemoryRepo {
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn attachment(&self, id: i64) -> Option<&AttachmentRow> {
        self.attachments.iter().find(|a| a.id == id)
    }

    /// Panic unless the positions of the collection are exactly `1..=N`.
    pub fn assert_dense(&self, owner: &OwnerId, collection: CollectionType) {
        let mut positions: Vec<Position> = self
            .items
            .iter()
            .filter(|i| &i.owner_id == owner && i.collection == collection)
            .map(|i| i.position)
            .collect();
        positions.sort_unstable();
        let expected: Vec<Position> = (1..=positions.len() as Position).collect();
        assert_eq!(positions, expected);
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn scoped(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
    ) -> impl Iterator<Item = &mut PositionedItem> {
        let owner = owner.clone();
        self.items
            .iter_mut()
            .filter(move |i| i.owner_id == owner && i.collection == collection)
    }
}

#[async_trait]
impl PositionRepo for MemoryRepo {
    async fn lock_collection(&mut self, _: &OwnerId, _: CollectionType) -> StoreResult<()> {
        Ok(())
    }

    async fn find_item(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
    ) -> StoreResult<Option<PositionedItem>> {
        Ok(self.scoped(owner, collection).find(|i| i.id == id).cloned())
    }

    async fn max_position(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
    ) -> StoreResult<Position> {
        Ok(self
            .scoped(owner, collection)
            .map(|i| i.position)
            .max()
            .unwrap_or(0))
    }

    async fn count(&mut self, owner: &OwnerId, collection: CollectionType) -> StoreResult<i64> {
        Ok(self.scoped(owner, collection).count() as i64)
    }

    async fn shift_positions(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        range: RangeInclusive<Position>,
        delta: i32,
    ) -> StoreResult<u64> {
        let mut shifted = 0;
        for item in self.scoped(owner, collection) {
            if range.contains(&item.position) {
                item.position += delta;
                shifted += 1;
            }
        }
        self.writes += shifted;
        Ok(shifted as u64)
    }

    async fn set_position(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
        position: Position,
    ) -> StoreResult<()> {
        if let Some(item) = self.scoped(owner, collection).find(|i| i.id == id) {
            item.position = position;
        }
        self.writes += 1;
        Ok(())
    }

    async fn insert_item(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        position: Position,
        payload: &Value,
    ) -> StoreResult<PositionedItem> {
        let now = OffsetDateTime::now_utc();
        let item = PositionedItem {
            id: self.next_id(),
            owner_id: owner.clone(),
            collection,
            position,
            payload: payload.clone(),
            created_at: now,
            updated_at: now,
        };
        self.items.push(item.clone());
        self.writes += 1;
        Ok(item)
    }

    async fn update_payload(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
        payload: &Value,
    ) -> StoreResult<Option<PositionedItem>> {
        let updated = self.scoped(owner, collection).find(|i| i.id == id).map(|item| {
            item.payload = payload.clone();
            item.updated_at = OffsetDateTime::now_utc();
            item.clone()
        });
        if updated.is_some() {
            self.writes += 1;
        }
        Ok(updated)
    }

    async fn delete_item(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
    ) -> StoreResult<u64> {
        let before = self.items.len();
        self.items
            .retain(|i| !(i.id == id && &i.owner_id == owner && i.collection == collection));
        let removed = before - self.items.len();
        self.writes += removed;
        Ok(removed as u64)
    }

    async fn list_items(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        order: ListOrder,
    ) -> StoreResult<Vec<PositionedItem>> {
        let mut items: Vec<_> = self.scoped(owner, collection).map(|i| i.clone()).collect();
        items.sort_by_key(|i| i.position);
        if order == ListOrder::Descending {
            items.reverse();
        }
        Ok(items)
    }
}

#[async_trait]
impl AttachmentRepo for MemoryRepo {
    async fn list_attachments(
        &mut self,
        owner: &OwnerId,
        parent_table: &str,
        parent_id: ItemId,
    ) -> StoreResult<Vec<AttachmentRow>> {
        Ok(self
            .attachments
            .iter()
            .filter(|a| {
                a.user_id == owner.as_str()
                    && a.parent_table == parent_table
                    && a.parent_id == parent_id
            })
            .cloned()
            .collect())
    }

    async fn list_attachments_for_parents(
        &mut self,
        owner: &OwnerId,
        parent_table: &str,
        parent_ids: &[ItemId],
    ) -> StoreResult<Vec<AttachmentRow>> {
        let mut rows: Vec<_> = self
            .attachments
            .iter()
            .filter(|a| {
                a.user_id == owner.as_str()
                    && a.parent_table == parent_table
                    && parent_ids.contains(&a.parent_id)
            })
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.parent_id, a.id));
        Ok(rows)
    }

    async fn insert_attachments(&mut self, attachments: &[NewAttachment]) -> StoreResult<()> {
        let now = OffsetDateTime::now_utc();
        for new in attachments {
            let id = self.next_id();
            self.attachments.push(AttachmentRow {
                id,
                parent_table: new.parent_table.to_string(),
                parent_id: new.parent_id,
                user_id: new.user_id.clone(),
                file_url: new.file_url.clone(),
                file_name: new.file_name.clone(),
                file_type: new.file_type.clone(),
                file_size: new.file_size,
                created_at: now,
                updated_at: now,
            });
            self.writes += 1;
        }
        Ok(())
    }

    async fn delete_attachments(&mut self, owner: &OwnerId, ids: &[i64]) -> StoreResult<u64> {
        let before = self.attachments.len();
        self.attachments
            .retain(|a| !(a.user_id == owner.as_str() && ids.contains(&a.id)));
        let removed = before - self.attachments.len();
        self.writes += removed;
        Ok(removed as u64)
    }

    async fn delete_attachments_for_parent(
        &mut self,
        owner: &OwnerId,
        parent_table: &str,
        parent_id: ItemId,
    ) -> StoreResult<u64> {
        let before = self.attachments.len();
        self.attachments.retain(|a| {
            !(a.user_id == owner.as_str()
                && a.parent_table == parent_table
                && a.parent_id == parent_id)
        });
        let removed = before - self.attachments.len();
        self.writes += removed;
        Ok(removed as u64)
    }
}

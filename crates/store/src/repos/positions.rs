//! Position repository.

use crate::error::StoreResult;
use crate::models::PositionedItem;
use async_trait::async_trait;
use folio_core::{CollectionType, ItemId, ListOrder, OwnerId, Position};
use serde_json::Value;
use std::ops::RangeInclusive;

/// Row-level access to the collection tables.
///
/// Every query is scoped to `(owner, collection)`. The collection selects the
/// backing table; the access pattern is identical for all of them. The
/// ordering invariants are maintained by [`crate::indexer`], not here.
#[async_trait]
pub trait PositionRepo: Send {
    /// Serialise concurrent mutations of one owner's collection until the
    /// enclosing transaction ends.
    async fn lock_collection(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
    ) -> StoreResult<()>;

    /// Load an item; `None` when absent or owned by someone else.
    async fn find_item(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
    ) -> StoreResult<Option<PositionedItem>>;

    /// Highest position in use, or 0 for an empty collection.
    async fn max_position(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
    ) -> StoreResult<Position>;

    /// Number of live items.
    async fn count(&mut self, owner: &OwnerId, collection: CollectionType) -> StoreResult<i64>;

    /// Add `delta` to the position of every item whose position lies in `range`.
    ///
    /// Returns the number of rows shifted.
    async fn shift_positions(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        range: RangeInclusive<Position>,
        delta: i32,
    ) -> StoreResult<u64>;

    async fn set_position(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
        position: Position,
    ) -> StoreResult<()>;

    async fn insert_item(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        position: Position,
        payload: &Value,
    ) -> StoreResult<PositionedItem>;

    /// Overwrite the payload, leaving the position untouched.
    async fn update_payload(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
        payload: &Value,
    ) -> StoreResult<Option<PositionedItem>>;

    /// Hard-delete an item. Returns the number of rows removed.
    async fn delete_item(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
    ) -> StoreResult<u64>;

    async fn list_items(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        order: ListOrder,
    ) -> StoreResult<Vec<PositionedItem>>;
}

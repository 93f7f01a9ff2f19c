//! Ordered collection indexer.
//!
//! Maintains the dense `1..=N` positions of an owner's collection across
//! append, move and remove. Written once against [`PositionRepo`] and shared
//! by every collection type. Each operation expects to run inside the
//! caller's transaction: the repo handed in is that transaction.

use crate::error::{StoreError, StoreResult};
use crate::models::PositionedItem;
use crate::repos::{AttachmentRepo, PositionRepo};
use folio_core::{CollectionType, ItemId, ListOrder, OwnerId, Position};
use serde_json::Value;

fn not_found(collection: CollectionType, id: ItemId) -> StoreError {
    StoreError::NotFound(format!("{collection} item {id}"))
}

/// Insert a new item at position `N + 1`. Existing items are not touched.
pub async fn append<R>(
    repo: &mut R,
    owner: &OwnerId,
    collection: CollectionType,
    payload: &Value,
) -> StoreResult<PositionedItem>
where
    R: PositionRepo + ?Sized,
{
    repo.lock_collection(owner, collection).await?;

    let max = repo.max_position(owner, collection).await?;
    let position = max
        .checked_add(1)
        .ok_or_else(|| StoreError::Internal(format!("{collection} position overflow")))?;

    let item = repo
        .insert_item(owner, collection, position, payload)
        .await?;

    tracing::debug!(
        owner_id = %owner,
        collection = %collection,
        item_id = item.id,
        position = position,
        "Appended item"
    );
    Ok(item)
}

/// Move an item to `new_position`, shifting the items in between by one.
///
/// Moving to the current position succeeds without writing anything.
pub async fn move_item<R>(
    repo: &mut R,
    owner: &OwnerId,
    collection: CollectionType,
    id: ItemId,
    new_position: Position,
) -> StoreResult<()>
where
    R: PositionRepo + ?Sized,
{
    repo.lock_collection(owner, collection).await?;

    let item = repo
        .find_item(owner, collection, id)
        .await?
        .ok_or_else(|| not_found(collection, id))?;

    if new_position < 1 {
        return Err(StoreError::InvalidArgument(format!(
            "position must be at least 1, got {new_position}"
        )));
    }

    let old_position = item.position;
    if old_position == new_position {
        return Ok(());
    }

    let count = repo.count(owner, collection).await?;
    if i64::from(new_position) > count {
        return Err(StoreError::InvalidArgument(format!(
            "position {new_position} is beyond the end of the collection ({count} items)"
        )));
    }

    let shifted = if old_position < new_position {
        repo.shift_positions(owner, collection, (old_position + 1)..=new_position, -1)
            .await?
    } else {
        repo.shift_positions(owner, collection, new_position..=(old_position - 1), 1)
            .await?
    };
    repo.set_position(owner, collection, id, new_position)
        .await?;

    tracing::debug!(
        owner_id = %owner,
        collection = %collection,
        item_id = id,
        from = old_position,
        to = new_position,
        shifted = shifted,
        "Moved item"
    );
    Ok(())
}

/// Delete an item and its attachments, closing the gap it leaves.
pub async fn remove<R>(
    repo: &mut R,
    owner: &OwnerId,
    collection: CollectionType,
    id: ItemId,
) -> StoreResult<()>
where
    R: PositionRepo + AttachmentRepo + ?Sized,
{
    repo.lock_collection(owner, collection).await?;

    let item = repo
        .find_item(owner, collection, id)
        .await?
        .ok_or_else(|| not_found(collection, id))?;

    let shifted = repo
        .shift_positions(owner, collection, item.position.saturating_add(1)..=Position::MAX, -1)
        .await?;
    repo.delete_item(owner, collection, id).await?;
    let attachments = repo
        .delete_attachments_for_parent(owner, collection.table_name(), id)
        .await?;

    tracing::debug!(
        owner_id = %owner,
        collection = %collection,
        item_id = id,
        position = item.position,
        shifted = shifted,
        attachments = attachments,
        "Removed item"
    );
    Ok(())
}

/// All items of the collection sorted by position in `order`.
pub async fn list<R>(
    repo: &mut R,
    owner: &OwnerId,
    collection: CollectionType,
    order: ListOrder,
) -> StoreResult<Vec<PositionedItem>>
where
    R: PositionRepo + ?Sized,
{
    repo.list_items(owner, collection, order).await
}

pub async fn get<R>(
    repo: &mut R,
    owner: &OwnerId,
    collection: CollectionType,
    id: ItemId,
) -> StoreResult<PositionedItem>
where
    R: PositionRepo + ?Sized,
{
    repo.find_item(owner, collection, id)
        .await?
        .ok_or_else(|| not_found(collection, id))
}

/// Overwrite an item's payload. Its position is unchanged.
pub async fn update<R>(
    repo: &mut R,
    owner: &OwnerId,
    collection: CollectionType,
    id: ItemId,
    payload: &Value,
) -> StoreResult<PositionedItem>
where
    R: PositionRepo + ?Sized,
{
    repo.update_payload(owner, collection, id, payload)
        .await?
        .ok_or_else(|| not_found(collection, id))
}

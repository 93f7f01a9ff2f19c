//! Collection service: one transaction per operation.
//!
//! Opens a transaction, runs the indexer, reconciler or profile repo inside
//! it and commits. An error drops the transaction, which rolls it back.

use crate::error::{StoreError, StoreResult};
use crate::indexer;
use crate::models::{AttachmentRow, PositionedItem, Profile, ProfileUpdate};
use crate::reconcile;
use crate::repos::{AttachmentRepo, ProfileRepo};
use crate::store::{PortfolioStore, StoreTx};
use folio_core::{CollectionMetadata, CollectionType, EntityPayload, ItemId, OwnerId, Position};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// An item together with its attachments, for collections that carry them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionEntry {
    #[serde(flatten)]
    pub item: PositionedItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<AttachmentRow>>,
}

#[derive(Clone)]
pub struct CollectionService {
    store: Arc<dyn PortfolioStore>,
}

impl CollectionService {
    pub fn new(store: Arc<dyn PortfolioStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn PortfolioStore> {
        &self.store
    }

    /// List a collection in its canonical order.
    pub async fn list(
        &self,
        owner: &OwnerId,
        collection: CollectionType,
    ) -> StoreResult<Vec<CollectionEntry>> {
        let mut tx = self.store.begin().await?;
        let entries = list_entries(&mut *tx, owner, collection).await?;
        tx.commit().await?;
        Ok(entries)
    }

    /// List another user's collection by their public profile slug.
    pub async fn list_public(
        &self,
        slug: &str,
        collection: CollectionType,
    ) -> StoreResult<Vec<CollectionEntry>> {
        let mut tx = self.store.begin().await?;
        let owner = tx
            .find_owner_by_slug(slug)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("portfolio {slug}")))?;
        let entries = list_entries(&mut *tx, &owner, collection).await?;
        tx.commit().await?;
        Ok(entries)
    }

    pub async fn get(
        &self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
    ) -> StoreResult<CollectionEntry> {
        let mut tx = self.store.begin().await?;
        let item = indexer::get(&mut *tx, owner, collection, id).await?;
        let attachments = if collection.has_attachments() {
            Some(
                tx.list_attachments(owner, collection.table_name(), id)
                    .await?,
            )
        } else {
            None
        };
        tx.commit().await?;
        Ok(CollectionEntry { item, attachments })
    }

    /// Append a new item and create its attachments.
    pub async fn create(
        &self,
        owner: &OwnerId,
        payload: &EntityPayload,
    ) -> StoreResult<CollectionEntry> {
        let collection = payload.collection();
        let stored = payload.to_stored()?;

        let mut tx = self.store.begin().await?;
        let item = indexer::append(&mut *tx, owner, collection, &stored).await?;
        let attachments = reconcile_attachments(&mut *tx, owner, &item, payload).await?;
        tx.commit().await?;

        tracing::info!(
            owner_id = %owner,
            collection = %collection,
            item_id = item.id,
            position = item.position,
            "Created item"
        );
        Ok(CollectionEntry { item, attachments })
    }

    /// Overwrite an item's payload and reconcile its attachments.
    pub async fn update(
        &self,
        owner: &OwnerId,
        id: ItemId,
        payload: &EntityPayload,
    ) -> StoreResult<CollectionEntry> {
        let collection = payload.collection();
        let stored = payload.to_stored()?;

        let mut tx = self.store.begin().await?;
        let item = indexer::update(&mut *tx, owner, collection, id, &stored).await?;
        let attachments = reconcile_attachments(&mut *tx, owner, &item, payload).await?;
        tx.commit().await?;

        tracing::info!(
            owner_id = %owner,
            collection = %collection,
            item_id = id,
            "Updated item"
        );
        Ok(CollectionEntry { item, attachments })
    }

    pub async fn remove(
        &self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
    ) -> StoreResult<()> {
        let mut tx = self.store.begin().await?;
        indexer::remove(&mut *tx, owner, collection, id).await?;
        tx.commit().await?;

        tracing::info!(
            owner_id = %owner,
            collection = %collection,
            item_id = id,
            "Removed item"
        );
        Ok(())
    }

    pub async fn move_item(
        &self,
        owner: &OwnerId,
        collection: CollectionType,
        id: ItemId,
        new_position: Position,
    ) -> StoreResult<()> {
        let mut tx = self.store.begin().await?;
        indexer::move_item(&mut *tx, owner, collection, id, new_position).await?;
        tx.commit().await?;

        tracing::info!(
            owner_id = %owner,
            collection = %collection,
            item_id = id,
            position = new_position,
            "Reordered item"
        );
        Ok(())
    }

    pub async fn get_metadata(
        &self,
        owner: &OwnerId,
        collection: CollectionType,
    ) -> StoreResult<Option<CollectionMetadata>> {
        let mut tx = self.store.begin().await?;
        let metadata = tx.get_collection_metadata(owner, collection).await?;
        tx.commit().await?;
        Ok(metadata)
    }

    pub async fn set_metadata(
        &self,
        owner: &OwnerId,
        collection: CollectionType,
        metadata: &CollectionMetadata,
    ) -> StoreResult<()> {
        let mut tx = self.store.begin().await?;
        tx.set_collection_metadata(owner, collection, metadata)
            .await?;
        tx.commit().await?;

        tracing::info!(
            owner_id = %owner,
            collection = %collection,
            "Updated collection metadata"
        );
        Ok(())
    }

    pub async fn get_profile(&self, owner: &OwnerId) -> StoreResult<Profile> {
        let mut tx = self.store.begin().await?;
        let profile = tx.get_profile(owner).await?;
        tx.commit().await?;
        profile.ok_or_else(|| StoreError::NotFound(format!("profile {owner}")))
    }

    pub async fn upsert_profile(
        &self,
        owner: &OwnerId,
        update: &ProfileUpdate,
    ) -> StoreResult<Profile> {
        let mut tx = self.store.begin().await?;
        let profile = tx.upsert_profile(owner, update).await?;
        tx.commit().await?;
        Ok(profile)
    }
}

async fn list_entries(
    tx: &mut dyn StoreTx,
    owner: &OwnerId,
    collection: CollectionType,
) -> StoreResult<Vec<CollectionEntry>> {
    let items = indexer::list(tx, owner, collection, collection.list_order()).await?;
    if !collection.has_attachments() {
        return Ok(items
            .into_iter()
            .map(|item| CollectionEntry {
                item,
                attachments: None,
            })
            .collect());
    }

    let ids: Vec<ItemId> = items.iter().map(|i| i.id).collect();
    let rows = tx
        .list_attachments_for_parents(owner, collection.table_name(), &ids)
        .await?;
    let mut by_parent: HashMap<ItemId, Vec<AttachmentRow>> = HashMap::new();
    for row in rows {
        by_parent.entry(row.parent_id).or_default().push(row);
    }
    Ok(items
        .into_iter()
        .map(|item| {
            let attachments = by_parent.remove(&item.id).unwrap_or_default();
            CollectionEntry {
                item,
                attachments: Some(attachments),
            }
        })
        .collect())
}

async fn reconcile_attachments(
    tx: &mut dyn StoreTx,
    owner: &OwnerId,
    item: &PositionedItem,
    payload: &EntityPayload,
) -> StoreResult<Option<Vec<AttachmentRow>>> {
    match payload.attachments() {
        Some(specs) => {
            let rows = reconcile::reconcile(
                tx,
                owner,
                item.collection.table_name(),
                item.id,
                specs,
            )
            .await?;
            Ok(Some(rows))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use folio_core::AttachmentSpec;
    use serde_json::json;

    async fn service() -> CollectionService {
        let store = SqliteStore::in_memory().await.unwrap();
        CollectionService::new(Arc::new(store))
    }

    fn gallery(urls: &[&str]) -> EntityPayload {
        let attachments: Vec<_> = urls
            .iter()
            .map(|url| {
                serde_json::to_value(AttachmentSpec {
                    file_name: "shot.png".to_string(),
                    file_type: "image/png".to_string(),
                    file_size: 100,
                    file_url: url.to_string(),
                })
                .unwrap()
            })
            .collect();
        EntityPayload::parse(
            CollectionType::WorkGallery,
            json!({
                "title": "Portfolio site",
                "description": "Static site with a REST backend.",
                "tech_used": ["rust", "axum", "sqlite"],
                "attachments": attachments,
            }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_list_includes_attachments() {
        let service = service().await;
        let alice = OwnerId::parse("alice").unwrap();

        let created = service
            .create(&alice, &gallery(&["https://cdn.example.com/a.png"]))
            .await
            .unwrap();
        assert_eq!(created.item.position, 1);
        assert_eq!(created.attachments.as_ref().unwrap().len(), 1);
        assert!(created.item.payload.get("attachments").is_none());

        let entries = service.list(&alice, CollectionType::WorkGallery).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].attachments, created.attachments);
    }

    #[tokio::test]
    async fn test_remove_deletes_attachments() {
        let service = service().await;
        let alice = OwnerId::parse("alice").unwrap();
        let created = service
            .create(&alice, &gallery(&["https://cdn.example.com/a.png"]))
            .await
            .unwrap();

        service
            .remove(&alice, CollectionType::WorkGallery, created.item.id)
            .await
            .unwrap();

        let mut tx = service.store().begin().await.unwrap();
        let left = tx
            .list_attachments(&alice, "tech_projects", created.item.id)
            .await
            .unwrap();
        assert!(left.is_empty());
    }

    #[tokio::test]
    async fn test_failed_create_rolls_back() {
        let service = service().await;
        let alice = OwnerId::parse("alice").unwrap();
        let dup = gallery(&["https://cdn.example.com/a.png", "https://cdn.example.com/a.png"]);

        let err = service.create(&alice, &dup).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));

        let entries = service.list(&alice, CollectionType::WorkGallery).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_metadata_requires_profile() {
        let service = service().await;
        let alice = OwnerId::parse("alice").unwrap();
        let metadata = CollectionMetadata {
            heading: "Hackathons".to_string(),
            description: "Weekend builds".to_string(),
        };

        let err = service
            .set_metadata(&alice, CollectionType::Hackathon, &metadata)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        service
            .upsert_profile(
                &alice,
                &ProfileUpdate {
                    email: "alice@example.com".to_string(),
                    full_name: Some("Alice".to_string()),
                    avatar_url: None,
                    slug: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(
            service
                .get_metadata(&alice, CollectionType::Hackathon)
                .await
                .unwrap(),
            None
        );

        service
            .set_metadata(&alice, CollectionType::Hackathon, &metadata)
            .await
            .unwrap();
        assert_eq!(
            service
                .get_metadata(&alice, CollectionType::Hackathon)
                .await
                .unwrap(),
            Some(metadata)
        );
    }
}

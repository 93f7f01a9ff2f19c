//! Test fixtures.

use folio_core::{AttachmentSpec, CollectionType, EntityPayload, OwnerId};
use folio_store::{CollectionService, PortfolioStore, ProfileUpdate};
use serde_json::{Value, json};
use std::sync::Arc;

pub fn owner(id: &str) -> OwnerId {
    OwnerId::parse(id).expect("valid owner id")
}

/// A valid hackathon payload whose title is `title`.
pub fn hackathon(title: &str) -> EntityPayload {
    EntityPayload::parse(
        CollectionType::Hackathon,
        json!({
            "title": title,
            "location": "Berlin, Germany",
            "start_date": "2024-03-01",
            "end_date": "2024-03-03",
            "description": "Forty-eight hours of building things.",
            "links": [],
        }),
    )
    .expect("valid hackathon payload")
}

pub fn attachment(url: &str) -> AttachmentSpec {
    AttachmentSpec {
        file_name: "screenshot.png".to_string(),
        file_type: "image/png".to_string(),
        file_size: 4096,
        file_url: url.to_string(),
    }
}

/// A valid work-gallery payload carrying attachments for `urls`.
pub fn gallery_project(title: &str, urls: &[&str]) -> EntityPayload {
    let attachments: Vec<Value> = urls
        .iter()
        .map(|url| serde_json::to_value(attachment(url)).expect("serialize attachment"))
        .collect();
    EntityPayload::parse(
        CollectionType::WorkGallery,
        json!({
            "title": title,
            "description": "A project shown in the gallery.",
            "tech_used": ["rust", "sqlx", "axum"],
            "links": [{"platform": "Demo", "label": "live", "url": "https://demo.example.com"}],
            "attachments": attachments,
        }),
    )
    .expect("valid gallery payload")
}

/// Titles of a collection in ascending position order.
pub async fn titles_ascending(
    service: &CollectionService,
    owner: &OwnerId,
    collection: CollectionType,
) -> Vec<String> {
    let mut entries = service
        .list(owner, collection)
        .await
        .expect("list collection");
    entries.sort_by_key(|e| e.item.position);
    entries
        .into_iter()
        .map(|e| e.item.payload["title"].as_str().unwrap_or_default().to_string())
        .collect()
}

/// Positions of a collection, sorted.
pub async fn positions(
    service: &CollectionService,
    owner: &OwnerId,
    collection: CollectionType,
) -> Vec<i32> {
    let mut positions: Vec<i32> = service
        .list(owner, collection)
        .await
        .expect("list collection")
        .iter()
        .map(|e| e.item.position)
        .collect();
    positions.sort_unstable();
    positions
}

pub async fn create_profile(service: &CollectionService, owner: &OwnerId) {
    service
        .upsert_profile(
            owner,
            &ProfileUpdate {
                email: format!("{owner}@example.com"),
                full_name: Some("Test User".to_string()),
                avatar_url: None,
                slug: Some(owner.to_string()),
            },
        )
        .await
        .expect("create profile");
}

pub fn service(store: Arc<dyn PortfolioStore>) -> CollectionService {
    CollectionService::new(store)
}

//! Core domain types for the Folio portfolio backend.
//!
//! This crate defines the vocabulary shared by the store and the server:
//! - Collection types, positions and list ordering
//! - Owner identifiers
//! - Entity payload schemas and their validation
//! - Attachment descriptors and collection metadata
//! - Configuration

pub mod attachment;
pub mod collection;
pub mod config;
pub mod entity;
pub mod error;
pub mod metadata;
pub mod owner;
pub mod validate;

pub use attachment::AttachmentSpec;
pub use collection::{CollectionType, ItemId, ListOrder, Position};
pub use entity::EntityPayload;
pub use error::{Error, Result};
pub use metadata::CollectionMetadata;
pub use owner::OwnerId;

/// Upper bound accepted for a reorder target by the HTTP layer.
pub const MAX_POSITION: Position = 1000;

//! Profile repository and the collection metadata side-channel.

use crate::error::StoreResult;
use crate::models::{Profile, ProfileUpdate};
use async_trait::async_trait;
use folio_core::{CollectionMetadata, CollectionType, OwnerId};

/// Repository for user profiles.
///
/// Collection metadata is stored under `attributes.<collection>_metadata` and
/// written with a JSON path set, so sibling attribute keys are preserved.
#[async_trait]
pub trait ProfileRepo: Send {
    async fn get_profile(&mut self, owner: &OwnerId) -> StoreResult<Option<Profile>>;

    /// Resolve a public slug to the profile's owner.
    async fn find_owner_by_slug(&mut self, slug: &str) -> StoreResult<Option<OwnerId>>;

    /// Insert or update the basic profile columns. Attributes are untouched.
    ///
    /// A slug already held by another profile is `InvalidArgument`.
    async fn upsert_profile(
        &mut self,
        owner: &OwnerId,
        update: &ProfileUpdate,
    ) -> StoreResult<Profile>;

    /// Read a collection's metadata.
    ///
    /// Returns `NotFound` when the profile row is missing and `None` when the
    /// metadata was never set.
    async fn get_collection_metadata(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
    ) -> StoreResult<Option<CollectionMetadata>>;

    /// Overwrite a collection's metadata. `NotFound` when the profile row is missing.
    async fn set_collection_metadata(
        &mut self,
        owner: &OwnerId,
        collection: CollectionType,
        metadata: &CollectionMetadata,
    ) -> StoreResult<()>;
}

//! Per-collection heading and description shown above a portfolio section.

use crate::validate;
use serde::{Deserialize, Serialize};

/// Metadata of one collection, stored on the owner's profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub heading: String,
    pub description: String,
}

impl CollectionMetadata {
    pub fn validate(&self) -> crate::Result<()> {
        validate::length("heading", &self.heading, 3, 100)?;
        validate::length("description", &self.description, 3, 1000)
    }
}

//! Collection types and list ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an item within its owner's collection (1-based).
pub type Position = i32;

/// Database identifier of a positioned item.
pub type ItemId = i64;

/// The kinds of per-user ordered collections.
///
/// Every collection shares identical ordering mechanics; only the backing
/// table and the payload schema differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    Education,
    Certification,
    Hackathon,
    WorkExperience,
    WorkGallery,
}

/// Direction in which a collection is listed by position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOrder {
    Ascending,
    Descending,
}

impl ListOrder {
    /// SQL keyword for `ORDER BY order_index <dir>`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl CollectionType {
    /// All collection types.
    pub const ALL: [CollectionType; 5] = [
        Self::Education,
        Self::Certification,
        Self::Hackathon,
        Self::WorkExperience,
        Self::WorkGallery,
    ];

    /// Parse from the URL path segment (e.g. "experiences").
    pub fn from_slug(slug: &str) -> crate::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.slug() == slug)
            .ok_or_else(|| crate::Error::UnknownCollection(slug.to_string()))
    }

    /// Canonical tag, also used to address collection metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Education => "education",
            Self::Certification => "certification",
            Self::Hackathon => "hackathon",
            Self::WorkExperience => "work_experience",
            Self::WorkGallery => "work_gallery",
        }
    }

    /// URL path segment under `/v1/portfolio`.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Education => "educations",
            Self::Certification => "certifications",
            Self::Hackathon => "hackathons",
            Self::WorkExperience => "experiences",
            Self::WorkGallery => "work-gallery",
        }
    }

    /// Backing table. Also the `parent_table` value of owned attachments.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Education => "educations",
            Self::Certification => "certifications",
            Self::Hackathon => "hackathons",
            Self::WorkExperience => "work_experiences",
            Self::WorkGallery => "tech_projects",
        }
    }

    /// Key of this collection's metadata inside the profile attributes.
    pub fn metadata_key(&self) -> String {
        format!("{}_metadata", self.as_str())
    }

    /// Canonical listing direction: newest (highest position) first.
    pub fn list_order(&self) -> ListOrder {
        ListOrder::Descending
    }

    /// Whether items of this collection carry attachments.
    pub fn has_attachments(&self) -> bool {
        matches!(self, Self::WorkGallery)
    }
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_round_trip() {
        for collection in CollectionType::ALL {
            assert_eq!(
                CollectionType::from_slug(collection.slug()).unwrap(),
                collection
            );
        }
    }

    #[test]
    fn test_unknown_slug() {
        let err = CollectionType::from_slug("blogs").unwrap_err();
        assert!(matches!(err, crate::Error::UnknownCollection(s) if s == "blogs"));
    }

    #[test]
    fn test_table_names_are_distinct() {
        let mut tables: Vec<_> = CollectionType::ALL.iter().map(|c| c.table_name()).collect();
        tables.sort();
        tables.dedup();
        assert_eq!(tables.len(), CollectionType::ALL.len());
    }

    #[test]
    fn test_metadata_key() {
        assert_eq!(
            CollectionType::WorkGallery.metadata_key(),
            "work_gallery_metadata"
        );
    }
}

//! Client-submitted attachment descriptors.

use crate::validate;
use serde::{Deserialize, Serialize};

/// An attachment as submitted by the client.
///
/// `file_url` is issued by a presigned upload and is treated as the identity
/// of the attachment: two specs with the same URL describe the same file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSpec {
    #[serde(rename = "name")]
    pub file_name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    #[serde(rename = "size")]
    pub file_size: i64,
    #[serde(rename = "url")]
    pub file_url: String,
}

impl AttachmentSpec {
    pub fn validate(&self) -> crate::Result<()> {
        validate::length("attachments.name", &self.file_name, 3, 100)?;
        validate::length("attachments.type", &self.file_type, 3, 100)?;
        if self.file_size <= 0 {
            return Err(crate::Error::Validation {
                field: "attachments.size".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        validate::url("attachments.url", &self.file_url)
    }
}

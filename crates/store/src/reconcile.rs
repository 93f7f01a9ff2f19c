//! Attachment reconciliation.
//!
//! Diffs a submitted attachment list against the persisted one using
//! `file_url` as identity, then applies the minimal set of deletes and
//! creates. Matched attachments are never rewritten.

use crate::error::{StoreError, StoreResult};
use crate::models::{AttachmentRow, NewAttachment};
use crate::repos::AttachmentRepo;
use folio_core::{AttachmentSpec, ItemId, OwnerId};
use std::collections::{HashMap, HashSet};

/// Outcome of diffing submitted attachments against persisted ones.
#[derive(Debug, PartialEq)]
pub struct ReconcilePlan<'a> {
    /// Persisted rows matched by a submitted URL.
    pub keep: Vec<&'a AttachmentRow>,
    /// Submitted specs with no persisted match.
    pub create: Vec<&'a AttachmentSpec>,
    /// Ids of persisted rows no longer submitted.
    pub delete: Vec<i64>,
}

impl ReconcilePlan<'_> {
    pub fn is_noop(&self) -> bool {
        self.create.is_empty() && self.delete.is_empty()
    }
}

/// Compute the reconcile plan without touching storage.
///
/// Rejects submissions that repeat a URL. A persisted URL that appears more
/// than once keeps its first row; later duplicates are scheduled for deletion.
pub fn plan<'a>(
    persisted: &'a [AttachmentRow],
    submitted: &'a [AttachmentSpec],
) -> StoreResult<ReconcilePlan<'a>> {
    let mut seen = HashSet::with_capacity(submitted.len());
    for spec in submitted {
        if !seen.insert(spec.file_url.as_str()) {
            return Err(StoreError::InvalidArgument(format!(
                "duplicate attachment url: {}",
                spec.file_url
            )));
        }
    }

    let mut by_url: HashMap<&str, &AttachmentRow> = HashMap::with_capacity(persisted.len());
    let mut delete = Vec::new();
    for row in persisted {
        if by_url.contains_key(row.file_url.as_str()) {
            delete.push(row.id);
        } else {
            by_url.insert(row.file_url.as_str(), row);
        }
    }

    let mut keep = Vec::new();
    let mut create = Vec::new();
    for spec in submitted {
        match by_url.remove(spec.file_url.as_str()) {
            Some(row) => keep.push(row),
            None => create.push(spec),
        }
    }

    delete.extend(by_url.into_values().map(|row| row.id));
    delete.sort_unstable();

    Ok(ReconcilePlan {
        keep,
        create,
        delete,
    })
}

/// Bring the attachments of one parent in line with `submitted`.
///
/// Returns the persisted rows in submitted order.
pub async fn reconcile<R>(
    repo: &mut R,
    owner: &OwnerId,
    parent_table: &'static str,
    parent_id: ItemId,
    submitted: &[AttachmentSpec],
) -> StoreResult<Vec<AttachmentRow>>
where
    R: AttachmentRepo + ?Sized,
{
    let persisted = repo.list_attachments(owner, parent_table, parent_id).await?;
    let plan = plan(&persisted, submitted)?;

    if plan.is_noop() {
        return resolve(&persisted, submitted);
    }

    if !plan.delete.is_empty() {
        repo.delete_attachments(owner, &plan.delete).await?;
    }

    if !plan.create.is_empty() {
        let rows: Vec<NewAttachment> = plan
            .create
            .iter()
            .map(|spec| NewAttachment {
                parent_table,
                parent_id,
                user_id: owner.as_str().to_string(),
                file_url: spec.file_url.clone(),
                file_name: spec.file_name.clone(),
                file_type: spec.file_type.clone(),
                file_size: spec.file_size,
            })
            .collect();
        repo.insert_attachments(&rows).await?;
    }

    tracing::debug!(
        owner_id = %owner,
        parent_table = parent_table,
        parent_id = parent_id,
        kept = plan.keep.len(),
        created = plan.create.len(),
        deleted = plan.delete.len(),
        "Reconciled attachments"
    );

    let current = repo.list_attachments(owner, parent_table, parent_id).await?;
    resolve(&current, submitted)
}

fn resolve(rows: &[AttachmentRow], submitted: &[AttachmentSpec]) -> StoreResult<Vec<AttachmentRow>> {
    let by_url: HashMap<&str, &AttachmentRow> =
        rows.iter().map(|row| (row.file_url.as_str(), row)).collect();
    submitted
        .iter()
        .map(|spec| {
            by_url
                .get(spec.file_url.as_str())
                .map(|row| (*row).clone())
                .ok_or_else(|| {
                    StoreError::Internal(format!(
                        "attachment {} missing after reconcile",
                        spec.file_url
                    ))
                })
        })
        .collect()
}

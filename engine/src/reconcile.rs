//! Reconciliation of a remote snapshot against a target record set.
//!
//! # Algorithm
//!
//! 1. Index the snapshot by business key (last-seen entry wins on repeats)
//! 2. For each target record, take its matching entry out of the index:
//!    a hit becomes an update, a miss becomes a create
//! 3. Whatever is left in the index becomes a delete
//!
//! Create and update order follow the target order, delete order follows the
//! snapshot order, so the same inputs always produce the same plan.

use crate::{
    record::{CanonicalRecord, RemoteEntry},
    snapshot::RemoteSnapshot,
    Code, RecordId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An existing row to overwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEntry {
    pub record_id: RecordId,
    pub fields: CanonicalRecord,
}

/// An existing row to remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteEntry {
    pub record_id: RecordId,
}

/// The three disjoint batches that bring the store in line with the target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationPlan {
    pub to_create: Vec<CanonicalRecord>,
    pub to_update: Vec<UpdateEntry>,
    pub to_delete: Vec<DeleteEntry>,
    /// Remote rows hidden by a later row with the same code. They are left
    /// untouched.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub shadowed: Vec<RecordId>,
}

impl ReconciliationPlan {
    /// True when no request needs to be issued.
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.to_create.len(),
            update: self.to_update.len(),
            delete: self.to_delete.len(),
            shadowed: self.shadowed.len(),
        }
    }

    pub fn delete_ids(&self) -> Vec<RecordId> {
        self.to_delete.iter().map(|d| d.record_id.clone()).collect()
    }
}

/// Batch sizes of a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub shadowed: usize,
}

/// Builds a [`ReconciliationPlan`] from one snapshot.
///
/// The index is owned by the reconciler and consumed by [`Reconciler::reconcile`].
pub struct Reconciler {
    /// Business key -> slot in `entries`
    index: HashMap<Code, usize>,
    /// Snapshot entries; a slot is emptied once matched or shadowed
    entries: Vec<Option<RemoteEntry>>,
    shadowed: Vec<RecordId>,
}

impl Reconciler {
    /// Index a snapshot by business key.
    pub fn new(snapshot: RemoteSnapshot) -> Self {
        let mut index: HashMap<Code, usize> = HashMap::with_capacity(snapshot.entries.len());
        let mut entries: Vec<Option<RemoteEntry>> = Vec::with_capacity(snapshot.entries.len());
        let mut shadowed = Vec::new();

        for entry in snapshot.entries {
            let slot = entries.len();
            if let Some(previous) = index.insert(entry.code().to_string(), slot) {
                // Last-seen wins; the earlier row drops out of the plan.
                if let Some(hidden) = entries[previous].take() {
                    shadowed.push(hidden.record_id);
                }
            }
            entries.push(Some(entry));
        }

        Self {
            index,
            entries,
            shadowed,
        }
    }

    /// Number of distinct codes in the snapshot.
    pub fn indexed(&self) -> usize {
        self.index.len()
    }

    /// Diff the target records against the indexed snapshot.
    pub fn reconcile(
        mut self,
        target: impl IntoIterator<Item = CanonicalRecord>,
    ) -> ReconciliationPlan {
        let mut plan = ReconciliationPlan {
            shadowed: std::mem::take(&mut self.shadowed),
            ..Default::default()
        };

        for record in target {
            let matched = self
                .index
                .remove(record.code())
                .and_then(|slot| self.entries[slot].take());

            match matched {
                Some(existing) => plan.to_update.push(UpdateEntry {
                    record_id: existing.record_id,
                    fields: record,
                }),
                None => plan.to_create.push(record),
            }
        }

        plan.to_delete = self
            .entries
            .into_iter()
            .flatten()
            .map(|entry| DeleteEntry {
                record_id: entry.record_id,
            })
            .collect();

        plan
    }
}

/// Compute the plan for a snapshot and a target set.
pub fn plan(snapshot: RemoteSnapshot, target: Vec<CanonicalRecord>) -> ReconciliationPlan {
    Reconciler::new(snapshot).reconcile(target)
}

//! Prerequisite resolution: are all referenced assignments completed?
//!
//! Design:
//! - Malformed references (id 0) are dropped before any lookup.
//! - One batch read for the whole list.
//! - `missing` uses set semantics; duplicates in the input collapse.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::domain::{
    AssignmentId, AssignmentSummary, DependencyResolution, StoreError, TaskAssignment,
};
use crate::ports::AssignmentStore;

/// Drop invalid ids and duplicates, keeping first-seen order.
pub fn normalize_dependency_ids(ids: &[AssignmentId]) -> Vec<AssignmentId> {
    let mut seen = BTreeSet::new();
    ids.iter()
        .copied()
        .filter(|id| id.is_valid() && seen.insert(*id))
        .collect()
}

/// Classify already-fetched prerequisites.
///
/// `requested` is expected to be normalized. Records in `found` that were not
/// requested are ignored.
pub fn evaluate_dependencies(
    requested: &[AssignmentId],
    found: &[TaskAssignment],
) -> DependencyResolution {
    let by_id: HashMap<AssignmentId, &TaskAssignment> = found.iter().map(|a| (a.id, a)).collect();

    let mut missing = BTreeSet::new();
    let mut incomplete = Vec::new();
    for id in requested {
        match by_id.get(id) {
            None => {
                missing.insert(*id);
            }
            Some(a) if !a.status.is_completed() => incomplete.push(AssignmentSummary::from(*a)),
            Some(_) => {}
        }
    }

    DependencyResolution {
        can_proceed: missing.is_empty() && incomplete.is_empty(),
        missing: missing.into_iter().collect(),
        incomplete,
    }
}

/// Fetches prerequisites from the store and classifies them.
#[derive(Clone)]
pub struct DependencyResolver {
    store: Arc<dyn AssignmentStore>,
}

impl DependencyResolver {
    pub fn new(store: Arc<dyn AssignmentStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, ids: &[AssignmentId]) -> Result<DependencyResolution, StoreError> {
        let requested = normalize_dependency_ids(ids);
        if requested.is_empty() {
            return Ok(DependencyResolution::satisfied());
        }

        let found = self.store.get_many(&requested).await?;
        let resolution = evaluate_dependencies(&requested, &found);
        debug!(
            requested = requested.len(),
            missing = resolution.missing.len(),
            incomplete = resolution.incomplete.len(),
            "dependencies resolved"
        );
        Ok(resolution)
    }
}

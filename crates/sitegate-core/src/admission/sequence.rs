//! Same-day ordering: may this assignment start given the worker's earlier ones?
//!
//! Only strictly lower sequence numbers within the same (employee, project,
//! date) are considered. Peers sharing a sequence number are not ordered
//! against each other.

use tracing::debug;

use crate::domain::{AssignmentSummary, SequenceResolution, TaskAssignment};

fn same_partition(a: &TaskAssignment, b: &TaskAssignment) -> bool {
    a.employee_id == b.employee_id && a.project_id == b.project_id && a.date == b.date
}

/// Stateless; the peer set is supplied by the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceResolver;

impl SequenceResolver {
    pub fn resolve(&self, target: &TaskAssignment, peers: &[TaskAssignment]) -> SequenceResolution {
        let Some(target_sequence) = target.ordered_sequence() else {
            return SequenceResolution::satisfied();
        };

        let mut blocking: Vec<AssignmentSummary> = peers
            .iter()
            .filter(|p| p.id != target.id && same_partition(p, target))
            .filter(|p| p.sequence.is_some_and(|s| s < target_sequence))
            .filter(|p| !p.status.is_completed())
            .map(AssignmentSummary::from)
            .collect();
        blocking.sort_by_key(|b| (b.sequence, b.id));

        debug!(
            target = %target.id,
            sequence = target_sequence,
            blocking = blocking.len(),
            "sequence resolved"
        );
        SequenceResolution {
            can_proceed: blocking.is_empty(),
            blocking,
        }
    }
}

//! Assignment status and its forward-only ordering.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a task assignment.
///
/// State transitions:
/// - Queued -> InProgress (start)
/// - InProgress -> Completed (progress reaches 100)
///
/// Nothing ever moves backwards. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    /// Scheduled, not yet started by the worker.
    Queued,

    /// Started inside the geofence, work ongoing.
    InProgress,

    /// Progress reached 100%.
    Completed,
}

impl AssignmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Queued => "queued",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
        }
    }

    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, AssignmentStatus::Completed)
    }

    pub fn is_completed(self) -> bool {
        self == AssignmentStatus::Completed
    }

    /// Only the two forward edges of the lifecycle exist.
    pub fn can_transition_to(self, next: AssignmentStatus) -> bool {
        matches!(
            (self, next),
            (AssignmentStatus::Queued, AssignmentStatus::InProgress)
                | (AssignmentStatus::InProgress, AssignmentStatus::Completed)
        )
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn serializes_as_snake_case() {
        let s = serde_json::to_string(&AssignmentStatus::InProgress).unwrap();
        assert_eq!(s, "\"in_progress\"");
    }

    #[rstest]
    #[case::start(AssignmentStatus::Queued, AssignmentStatus::InProgress, true)]
    #[case::complete(AssignmentStatus::InProgress, AssignmentStatus::Completed, true)]
    #[case::skip(AssignmentStatus::Queued, AssignmentStatus::Completed, false)]
    #[case::reopen(AssignmentStatus::Completed, AssignmentStatus::InProgress, false)]
    #[case::requeue(AssignmentStatus::InProgress, AssignmentStatus::Queued, false)]
    #[case::self_loop(AssignmentStatus::InProgress, AssignmentStatus::InProgress, false)]
    fn only_forward_edges_exist(
        #[case] from: AssignmentStatus,
        #[case] to: AssignmentStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn only_completed_is_terminal() {
        assert!(!AssignmentStatus::Queued.is_terminal());
        assert!(!AssignmentStatus::InProgress.is_terminal());
        assert!(AssignmentStatus::Completed.is_terminal());
    }
}

//! Decision detail produced by the admission gates.
//!
//! These are plain data. Each gate returns one of them and the state machine
//! either proceeds or copies it verbatim into the rejection, so a client can
//! explain exactly what is blocking a start.

use serde::{Deserialize, Serialize};

use super::assignment::TaskAssignment;
use super::geo::GpsQuality;
use super::ids::AssignmentId;
use super::status::AssignmentStatus;

/// Which rule made a fix admissible, or that none did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GeofenceReason {
    InsideRadius,
    WithinAllowedVariance,
    WithinAccuracyBuffer,
    OutsideGeofence,
}

/// Result of evaluating one position against one geofence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceEvaluation {
    pub distance_meters: f64,
    pub inside_radius: bool,
    pub admissible: bool,

    /// Configured radius of the fence.
    pub radius_meters: f64,

    /// Distance up to which the fix would have been admitted without
    /// accuracy credit (radius, plus variance when not strict).
    pub allowed_radius_meters: f64,

    /// Accuracy credit that was available for this fix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_buffer_meters: Option<f64>,

    pub gps_quality: GpsQuality,
    pub reason: GeofenceReason,
}

/// Compact view of an assignment used in blocking detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentSummary {
    pub id: AssignmentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
    pub status: AssignmentStatus,
    pub progress_percent: u8,
}

impl From<&TaskAssignment> for AssignmentSummary {
    fn from(a: &TaskAssignment) -> Self {
        Self {
            id: a.id,
            sequence: a.sequence,
            status: a.status,
            progress_percent: a.progress_percent,
        }
    }
}

/// Outcome of the prerequisite check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyResolution {
    pub can_proceed: bool,

    /// Referenced ids with no matching assignment, ascending.
    #[serde(rename = "missingDependencies")]
    pub missing: Vec<AssignmentId>,

    /// Found prerequisites that are not completed yet.
    #[serde(rename = "incompleteDependencies")]
    pub incomplete: Vec<AssignmentSummary>,
}

impl DependencyResolution {
    pub fn satisfied() -> Self {
        Self {
            can_proceed: true,
            ..Self::default()
        }
    }
}

/// Outcome of the same-day ordering check.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceResolution {
    pub can_proceed: bool,

    /// Earlier-sequence peers that are not completed, by (sequence, id).
    #[serde(rename = "incompleteEarlierTasks")]
    pub blocking: Vec<AssignmentSummary>,
}

impl SequenceResolution {
    pub fn satisfied() -> Self {
        Self {
            can_proceed: true,
            blocking: Vec::new(),
        }
    }
}

/// Full pre-start report: every gate evaluated, nothing written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartEligibility {
    pub assignment: AssignmentSummary,
    pub can_start: bool,

    pub geofence_required: bool,

    /// `None` when the assignment does not require a position check and no
    /// position was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geofence: Option<GeofenceEvaluation>,

    pub dependencies: DependencyResolution,
    pub sequence: SequenceResolution,
}

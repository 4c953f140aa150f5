//! Task assignment record: the unit the admission kernel gates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::geo::GeoPoint;
use super::ids::{AssignmentId, EmployeeId, ProjectId, SupervisorId, TaskId};
use super::status::AssignmentStatus;

pub const MAX_PROGRESS: u8 = 100;

/// Rule violations detected while applying a transition to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("assignment already {0}")]
    AlreadyStarted(AssignmentStatus),

    #[error("assignment already completed")]
    AlreadyCompleted,

    #[error("assignment has not been started")]
    NotStarted,

    #[error("progress cannot decrease from {current}% to {attempted}%")]
    ProgressDecrease { current: u8, attempted: u8 },

    #[error("progress {0}% is above 100%")]
    ProgressOutOfRange(u8),
}

/// Geofence requirement and the last position that satisfied it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceValidation {
    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub last_validated: Option<DateTime<Utc>>,

    #[serde(default)]
    pub validation_location: Option<GeoPoint>,
}

impl GeofenceValidation {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }
}

/// One entry of the worker-reported progress history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressNote {
    pub percent: u8,
    pub description: String,
    pub recorded_at: DateTime<Utc>,
}

/// A worker's daily task assignment.
///
/// Design:
/// - Foreign references are ids only; the record owns nothing else.
/// - All state transitions happen through the methods below, which enforce
///   forward-only status and non-decreasing progress.
/// - `assigned_at`, `start_time`, `completed_at` are each written once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssignment {
    pub id: AssignmentId,
    pub employee_id: EmployeeId,
    pub project_id: ProjectId,
    pub task_id: TaskId,
    pub supervisor_id: SupervisorId,

    /// Calendar day the assignment belongs to (`YYYY-MM-DD`).
    pub date: NaiveDate,

    pub status: AssignmentStatus,

    #[serde(default)]
    pub progress_percent: u8,

    /// Position in the worker's same-day, same-project order. `None`/`<= 1`
    /// means unordered or first.
    #[serde(default)]
    pub sequence: Option<u32>,

    /// Prerequisite assignments. Malformed entries are dropped on load.
    #[serde(default, deserialize_with = "deserialize_dependency_refs")]
    pub dependencies: Vec<AssignmentId>,

    #[serde(default)]
    pub geofence_validation: GeofenceValidation,

    pub assigned_at: DateTime<Utc>,

    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub progress_notes: Vec<ProgressNote>,

    /// Bumped on every accepted transition. Conditional writes compare it.
    #[serde(default)]
    pub revision: u64,
}

impl TaskAssignment {
    /// A freshly scheduled assignment: queued at 0%.
    pub fn new(
        id: AssignmentId,
        employee_id: EmployeeId,
        project_id: ProjectId,
        task_id: TaskId,
        supervisor_id: SupervisorId,
        date: NaiveDate,
        assigned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            employee_id,
            project_id,
            task_id,
            supervisor_id,
            date,
            status: AssignmentStatus::Queued,
            progress_percent: 0,
            sequence: None,
            dependencies: Vec::new(),
            geofence_validation: GeofenceValidation::default(),
            assigned_at,
            start_time: None,
            completed_at: None,
            progress_notes: Vec::new(),
            revision: 0,
        }
    }

    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = Some(sequence);
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<AssignmentId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_geofence_required(mut self) -> Self {
        self.geofence_validation = GeofenceValidation::required();
        self
    }

    pub fn is_owned_by(&self, employee_id: EmployeeId) -> bool {
        self.employee_id == employee_id
    }

    /// Effective sequence: `None` when unordered or first.
    pub fn ordered_sequence(&self) -> Option<u32> {
        self.sequence.filter(|s| *s > 1)
    }

    /// Queued -> InProgress.
    pub fn mark_started(
        &mut self,
        now: DateTime<Utc>,
        validated_at: Option<GeoPoint>,
    ) -> Result<(), TransitionError> {
        if self.status != AssignmentStatus::Queued {
            return Err(TransitionError::AlreadyStarted(self.status));
        }
        self.status = AssignmentStatus::InProgress;
        self.revision += 1;
        self.start_time.get_or_insert(now);
        if let Some(point) = validated_at {
            self.geofence_validation.last_validated = Some(now);
            self.geofence_validation.validation_location = Some(point);
        }
        Ok(())
    }

    /// Record a progress report. Reaching 100% completes the assignment in
    /// the same mutation.
    pub fn apply_progress(
        &mut self,
        percent: u8,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.check_progress(percent)?;

        self.progress_percent = percent;
        self.revision += 1;
        if percent == MAX_PROGRESS {
            self.status = AssignmentStatus::Completed;
            self.completed_at.get_or_insert(now);
        }
        self.progress_notes.push(ProgressNote {
            percent,
            description: description.into(),
            recorded_at: now,
        });
        Ok(())
    }

    /// Same rules as `apply_progress`, without mutating.
    pub fn check_progress(&self, percent: u8) -> Result<(), TransitionError> {
        if percent > MAX_PROGRESS {
            return Err(TransitionError::ProgressOutOfRange(percent));
        }
        match self.status {
            AssignmentStatus::Completed => return Err(TransitionError::AlreadyCompleted),
            AssignmentStatus::Queued => return Err(TransitionError::NotStarted),
            AssignmentStatus::InProgress => {}
        }
        if percent < self.progress_percent {
            return Err(TransitionError::ProgressDecrease {
                current: self.progress_percent,
                attempted: percent,
            });
        }
        Ok(())
    }
}

/// Accepts any JSON array and keeps only strictly positive integer entries.
///
/// Upstream documents store dependency lists loosely (strings, nulls, zeros).
/// Those are malformed references, not real prerequisites.
fn deserialize_dependency_refs<'de, D>(deserializer: D) -> Result<Vec<AssignmentId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .iter()
        .filter_map(serde_json::Value::as_i64)
        .filter_map(AssignmentId::from_raw)
        .collect())
}

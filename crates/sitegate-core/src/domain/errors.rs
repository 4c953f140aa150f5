//! Errors - エラー型と分類
//!
//! Every rejection the admission kernel produces maps to one stable
//! `ErrorCode`. Callers switch on the code and render `details()`; they never
//! parse messages.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use thiserror::Error;

use super::assignment::TransitionError;
use super::decision::{DependencyResolution, GeofenceEvaluation, SequenceResolution};
use super::geo::CoordinateError;
use super::ids::{AssignmentId, EmployeeId};
use super::status::AssignmentStatus;

/// Machine-readable rejection codes (wire format: SCREAMING_SNAKE_CASE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidLatitude,
    InvalidLongitude,
    MissingCoordinates,
    GeofenceValidationFailed,
    DependenciesNotMet,
    SequenceValidationFailed,
    AlreadyStarted,
    TaskAlreadyCompleted,
    TaskNotStarted,
    InvalidProgressDecrease,
    InvalidProgressValue,
    InvalidRequest,
    Unauthorized,
    NotFound,
    StorageUnavailable,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidLatitude => "INVALID_LATITUDE",
            ErrorCode::InvalidLongitude => "INVALID_LONGITUDE",
            ErrorCode::MissingCoordinates => "MISSING_COORDINATES",
            ErrorCode::GeofenceValidationFailed => "GEOFENCE_VALIDATION_FAILED",
            ErrorCode::DependenciesNotMet => "DEPENDENCIES_NOT_MET",
            ErrorCode::SequenceValidationFailed => "SEQUENCE_VALIDATION_FAILED",
            ErrorCode::AlreadyStarted => "ALREADY_STARTED",
            ErrorCode::TaskAlreadyCompleted => "TASK_ALREADY_COMPLETED",
            ErrorCode::TaskNotStarted => "TASK_NOT_STARTED",
            ErrorCode::InvalidProgressDecrease => "INVALID_PROGRESS_DECREASE",
            ErrorCode::InvalidProgressValue => "INVALID_PROGRESS_VALUE",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::StorageUnavailable => "STORAGE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ErrorKind は運用上の分類
///
/// - Validation: 入力または業務ルール違反（リトライ無意味）
/// - Conflict: 状態遷移の競合（再読込すれば判定が変わりうる）
/// - Infrastructure: ストレージ障害（呼び出し側がリトライを判断）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    Infrastructure,
}

/// Storage-layer failures. The only errors not produced by a business rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A rejected `start` / `progress` / eligibility request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdmissionError {
    #[error(transparent)]
    InvalidCoordinates(#[from] CoordinateError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("{assignment_id} is not assigned to {employee_id}")]
    Unauthorized {
        assignment_id: AssignmentId,
        employee_id: EmployeeId,
    },

    #[error("{assignment_id} is already {status}")]
    AlreadyStarted {
        assignment_id: AssignmentId,
        status: AssignmentStatus,
    },

    #[error(
        "position is {:.1} m from site center; allowed {:.1} m",
        .0.distance_meters,
        .0.allowed_radius_meters
    )]
    GeofenceValidationFailed(GeofenceEvaluation),

    #[error(
        "dependencies not met: {} missing, {} incomplete",
        .0.missing.len(),
        .0.incomplete.len()
    )]
    DependenciesNotMet(DependencyResolution),

    #[error("{} earlier task(s) in today's sequence are not completed", .0.blocking.len())]
    SequenceValidationFailed(SequenceResolution),

    #[error("{assignment_id} is already completed")]
    TaskAlreadyCompleted { assignment_id: AssignmentId },

    #[error("{assignment_id} has not been started")]
    TaskNotStarted { assignment_id: AssignmentId },

    #[error("progress cannot decrease from {current}% to {attempted}%")]
    InvalidProgressDecrease { current: u8, attempted: u8 },

    #[error("progress must be between 0 and 100, got {0}")]
    InvalidProgressValue(i64),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Storage(StoreError),

    /// The transition was committed but its location log entry was not.
    #[error("{assignment_id} was updated but its location log could not be written: {source}")]
    AuditLogUnavailable {
        assignment_id: AssignmentId,
        source: StoreError,
    },
}

impl AdmissionError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AdmissionError::InvalidCoordinates(CoordinateError::InvalidLatitude(_)) => {
                ErrorCode::InvalidLatitude
            }
            AdmissionError::InvalidCoordinates(CoordinateError::InvalidLongitude(_)) => {
                ErrorCode::InvalidLongitude
            }
            AdmissionError::InvalidCoordinates(CoordinateError::Missing) => {
                ErrorCode::MissingCoordinates
            }
            AdmissionError::NotFound { .. } => ErrorCode::NotFound,
            AdmissionError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AdmissionError::AlreadyStarted { .. } => ErrorCode::AlreadyStarted,
            AdmissionError::GeofenceValidationFailed(_) => ErrorCode::GeofenceValidationFailed,
            AdmissionError::DependenciesNotMet(_) => ErrorCode::DependenciesNotMet,
            AdmissionError::SequenceValidationFailed(_) => ErrorCode::SequenceValidationFailed,
            AdmissionError::TaskAlreadyCompleted { .. } => ErrorCode::TaskAlreadyCompleted,
            AdmissionError::TaskNotStarted { .. } => ErrorCode::TaskNotStarted,
            AdmissionError::InvalidProgressDecrease { .. } => ErrorCode::InvalidProgressDecrease,
            AdmissionError::InvalidProgressValue(_) => ErrorCode::InvalidProgressValue,
            AdmissionError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            AdmissionError::Storage(_) | AdmissionError::AuditLogUnavailable { .. } => {
                ErrorCode::StorageUnavailable
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AdmissionError::AlreadyStarted { .. } => ErrorKind::Conflict,
            AdmissionError::Storage(_) | AdmissionError::AuditLogUnavailable { .. } => {
                ErrorKind::Infrastructure
            }
            _ => ErrorKind::Validation,
        }
    }

    /// Structured decision detail for the response body.
    pub fn details(&self) -> serde_json::Value {
        match self {
            AdmissionError::InvalidCoordinates(CoordinateError::InvalidLatitude(v)) => {
                json!({ "latitude": v, "min": -90.0, "max": 90.0 })
            }
            AdmissionError::InvalidCoordinates(CoordinateError::InvalidLongitude(v)) => {
                json!({ "longitude": v, "min": -180.0, "max": 180.0 })
            }
            AdmissionError::InvalidCoordinates(CoordinateError::Missing) => {
                json!({ "required": ["latitude", "longitude"] })
            }
            AdmissionError::NotFound { entity, id } => json!({ "entity": entity, "id": id }),
            AdmissionError::Unauthorized {
                assignment_id,
                employee_id,
            } => json!({ "assignmentId": assignment_id, "employeeId": employee_id }),
            AdmissionError::AlreadyStarted {
                assignment_id,
                status,
            } => json!({ "assignmentId": assignment_id, "status": status }),
            AdmissionError::GeofenceValidationFailed(evaluation) => {
                serde_json::to_value(evaluation).unwrap_or_default()
            }
            AdmissionError::DependenciesNotMet(resolution) => {
                serde_json::to_value(resolution).unwrap_or_default()
            }
            AdmissionError::SequenceValidationFailed(resolution) => {
                serde_json::to_value(resolution).unwrap_or_default()
            }
            AdmissionError::TaskAlreadyCompleted { assignment_id }
            | AdmissionError::TaskNotStarted { assignment_id } => {
                json!({ "assignmentId": assignment_id })
            }
            AdmissionError::InvalidProgressDecrease { current, attempted } => {
                json!({ "current": current, "attempted": attempted })
            }
            AdmissionError::InvalidProgressValue(attempted) => {
                json!({ "attempted": attempted, "min": 0, "max": 100 })
            }
            AdmissionError::InvalidRequest(reason) => json!({ "reason": reason }),
            AdmissionError::Storage(_) => serde_json::Value::Null,
            AdmissionError::AuditLogUnavailable { assignment_id, .. } => {
                json!({ "assignmentId": assignment_id, "committed": true })
            }
        }
    }

    /// Lift a record-level rule violation into the client taxonomy.
    pub fn from_transition(assignment_id: AssignmentId, err: TransitionError) -> Self {
        match err {
            TransitionError::AlreadyStarted(status) => AdmissionError::AlreadyStarted {
                assignment_id,
                status,
            },
            TransitionError::AlreadyCompleted => {
                AdmissionError::TaskAlreadyCompleted { assignment_id }
            }
            TransitionError::NotStarted => AdmissionError::TaskNotStarted { assignment_id },
            TransitionError::ProgressDecrease { current, attempted } => {
                AdmissionError::InvalidProgressDecrease { current, attempted }
            }
            TransitionError::ProgressOutOfRange(v) => {
                AdmissionError::InvalidProgressValue(i64::from(v))
            }
        }
    }
}

impl From<StoreError> for AdmissionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => AdmissionError::NotFound { entity, id },
            other => AdmissionError::Storage(other),
        }
    }
}

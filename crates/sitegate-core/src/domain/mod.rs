//! Domain model (IDs, assignments, geofences, decisions, errors).
//!
//! Pure data and the invariants that belong to it. Nothing here performs I/O.

pub mod assignment;
pub mod decision;
pub mod errors;
pub mod geo;
pub mod ids;
pub mod location_log;
pub mod policy;
pub mod project;
pub mod status;

pub use assignment::{
    GeofenceValidation, MAX_PROGRESS, ProgressNote, TaskAssignment, TransitionError,
};
pub use decision::{
    AssignmentSummary, DependencyResolution, GeofenceEvaluation, GeofenceReason,
    SequenceResolution, StartEligibility,
};
pub use errors::{AdmissionError, ErrorCode, ErrorKind, StoreError};
pub use geo::{CoordinateError, GeoPoint, Geofence, GpsQuality, Position};
pub use ids::{AssignmentId, EmployeeId, LocationLogId, ProjectId, SupervisorId, TaskId};
pub use location_log::{LocationLogEntry, LogType, NewLocationLogEntry};
pub use policy::AccuracyPolicy;
pub use project::Project;
pub use status::AssignmentStatus;

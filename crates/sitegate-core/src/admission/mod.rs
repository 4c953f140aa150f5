//! Admission gates evaluated before an assignment may start.
//!
//! - **geofence**: is the worker on site?
//! - **dependency**: are the prerequisite assignments completed?
//! - **sequence**: are the worker's earlier assignments for the day completed?
//!
//! Each gate is read-only and returns decision detail from `domain::decision`.

pub mod dependency;
pub mod geofence;
pub mod sequence;

pub use self::dependency::{DependencyResolver, evaluate_dependencies, normalize_dependency_ids};
pub use self::geofence::{EARTH_RADIUS_METERS, GeofenceEvaluator, haversine_distance};
pub use self::sequence::SequenceResolver;

//! Location audit entries: append-only facts about where a worker was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geo::{GpsQuality, Position};
use super::ids::{AssignmentId, EmployeeId, LocationLogId, ProjectId};

/// Why a position sample was recorded.
///
/// Serialized as SCREAMING_SNAKE_CASE (`TASK_START`, `PROGRESS_UPDATE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogType {
    TaskStart,
    ProgressUpdate,
}

/// Entry as handed to the sink, before an id is allocated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocationLogEntry {
    pub employee_id: EmployeeId,
    pub project_id: ProjectId,
    pub task_assignment_id: AssignmentId,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub gps_quality: GpsQuality,
    pub inside_geofence: bool,
    pub log_type: LogType,
    pub timestamp: DateTime<Utc>,
}

impl NewLocationLogEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        employee_id: EmployeeId,
        project_id: ProjectId,
        task_assignment_id: AssignmentId,
        position: &Position,
        gps_quality: GpsQuality,
        inside_geofence: bool,
        log_type: LogType,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            employee_id,
            project_id,
            task_assignment_id,
            latitude: position.latitude(),
            longitude: position.longitude(),
            accuracy: position.accuracy,
            gps_quality,
            inside_geofence,
            log_type,
            timestamp,
        }
    }

    pub fn with_id(self, id: LocationLogId) -> LocationLogEntry {
        LocationLogEntry { id, entry: self }
    }
}

/// Persisted entry. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationLogEntry {
    pub id: LocationLogId,
    #[serde(flatten)]
    pub entry: NewLocationLogEntry,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn log_type_serializes_as_screaming_snake() {
        assert_eq!(serde_json::to_string(&LogType::TaskStart).unwrap(), "\"TASK_START\"");
        assert_eq!(
            serde_json::to_string(&LogType::ProgressUpdate).unwrap(),
            "\"PROGRESS_UPDATE\""
        );
    }

    #[test]
    fn persisted_entry_flattens_fields() {
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let position = Position::new(40.0, -74.0).unwrap().with_accuracy(8.0);
        let entry = NewLocationLogEntry::new(
            EmployeeId::new(1),
            ProjectId::new(2),
            AssignmentId::new(3),
            &position,
            GpsQuality::Good,
            true,
            LogType::TaskStart,
            at,
        )
        .with_id(LocationLogId::new(9));

        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["id"], 9);
        assert_eq!(v["taskAssignmentId"], 3);
        assert_eq!(v["logType"], "TASK_START");
        assert_eq!(v["insideGeofence"], true);
        assert_eq!(v["accuracy"], 8.0);
    }
}

//! Structured audit events for admission decisions.
//!
//! Every accepted or rejected transition is emitted as a `tracing` event with
//! a stable `event_type` field, so log pipelines can filter on it without
//! parsing messages. Rejections log at `warn`, storage failures at `error`.

use crate::domain::{
    AdmissionError, AssignmentId, EmployeeId, ErrorKind, GeofenceEvaluation, LocationLogEntry,
};

/// Event types.
pub mod events {
    /// Assignment moved from queued to in progress.
    pub const START_ACCEPTED: &str = "assignment.start.accepted";
    /// Start refused by a gate or by the assignment's status.
    pub const START_REJECTED: &str = "assignment.start.rejected";
    /// Start admitted only because of GPS accuracy credit.
    pub const START_DEGRADED_GPS: &str = "assignment.start.degraded_gps";

    /// Progress recorded.
    pub const PROGRESS_ACCEPTED: &str = "assignment.progress.accepted";
    /// Progress refused.
    pub const PROGRESS_REJECTED: &str = "assignment.progress.rejected";
    /// Progress reached 100 and the assignment completed.
    pub const COMPLETED: &str = "assignment.completed";

    /// Write lost a compare-and-swap race and was re-evaluated.
    pub const WRITE_CONFLICT: &str = "assignment.write.conflict";

    /// Location audit entry appended.
    pub const LOCATION_LOGGED: &str = "location.logged";
    /// Location audit entry could not be appended.
    pub const LOCATION_LOG_FAILED: &str = "location.log_failed";
}

/// Log an accepted start.
pub fn log_start_accepted(
    assignment_id: AssignmentId,
    employee_id: EmployeeId,
    evaluation: Option<&GeofenceEvaluation>,
) {
    tracing::info!(
        event_type = events::START_ACCEPTED,
        assignment_id = %assignment_id,
        employee_id = %employee_id,
        distance_m = evaluation.map(|e| e.distance_meters),
        "Assignment started"
    );
}

/// Log an admission granted through the accuracy buffer.
pub fn log_degraded_gps_start(assignment_id: AssignmentId, evaluation: &GeofenceEvaluation) {
    tracing::warn!(
        event_type = events::START_DEGRADED_GPS,
        assignment_id = %assignment_id,
        distance_m = evaluation.distance_meters,
        allowed_m = evaluation.allowed_radius_meters,
        buffer_m = evaluation.accuracy_buffer_meters,
        gps_quality = ?evaluation.gps_quality,
        "Start admitted on degraded GPS"
    );
}

/// Log a refused start.
pub fn log_start_rejected(
    assignment_id: AssignmentId,
    employee_id: EmployeeId,
    error: &AdmissionError,
) {
    log_rejection(events::START_REJECTED, assignment_id, employee_id, error);
}

/// Log an accepted progress update.
pub fn log_progress_accepted(
    assignment_id: AssignmentId,
    employee_id: EmployeeId,
    from_percent: u8,
    to_percent: u8,
    completed: bool,
) {
    tracing::info!(
        event_type = events::PROGRESS_ACCEPTED,
        assignment_id = %assignment_id,
        employee_id = %employee_id,
        from_percent,
        to_percent,
        "Progress recorded"
    );
    if completed {
        tracing::info!(
            event_type = events::COMPLETED,
            assignment_id = %assignment_id,
            employee_id = %employee_id,
            "Assignment completed"
        );
    }
}

/// Log a refused progress update.
pub fn log_progress_rejected(
    assignment_id: AssignmentId,
    employee_id: EmployeeId,
    error: &AdmissionError,
) {
    log_rejection(events::PROGRESS_REJECTED, assignment_id, employee_id, error);
}

/// Log a lost compare-and-swap.
pub fn log_write_conflict(assignment_id: AssignmentId, attempt: u32, max_attempts: u32) {
    tracing::debug!(
        event_type = events::WRITE_CONFLICT,
        assignment_id = %assignment_id,
        attempt,
        max_attempts,
        "Concurrent write detected, re-evaluating"
    );
}

/// Log an appended location entry.
pub fn log_location_appended(entry: &LocationLogEntry) {
    tracing::debug!(
        event_type = events::LOCATION_LOGGED,
        location_log_id = %entry.id,
        assignment_id = %entry.entry.task_assignment_id,
        log_type = ?entry.entry.log_type,
        inside_geofence = entry.entry.inside_geofence,
        "Location logged"
    );
}

/// Log a location entry that could not be appended.
pub fn log_location_append_failed(assignment_id: AssignmentId, error: &str) {
    tracing::error!(
        event_type = events::LOCATION_LOG_FAILED,
        assignment_id = %assignment_id,
        error = %error,
        "Failed to append location log"
    );
}

fn log_rejection(
    event_type: &'static str,
    assignment_id: AssignmentId,
    employee_id: EmployeeId,
    error: &AdmissionError,
) {
    match error.kind() {
        ErrorKind::Infrastructure => tracing::error!(
            event_type,
            assignment_id = %assignment_id,
            employee_id = %employee_id,
            code = %error.code(),
            error = %error,
            "Admission failed on storage"
        ),
        _ => tracing::warn!(
            event_type,
            assignment_id = %assignment_id,
            employee_id = %employee_id,
            code = %error.code(),
            reason = %error,
            "Admission rejected"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DependencyResolution, GpsQuality, LocationLogId, LogType, NewLocationLogEntry, Position,
        ProjectId, StoreError,
    };
    use chrono::{TimeZone, Utc};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct StringWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for StringWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for StringWriter {
        type Writer = StringWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn with_captured_logs<F>(f: F) -> String
    where
        F: FnOnce(),
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::fmt()
            .with_writer(StringWriter(buffer.clone()))
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, f);

        let bytes = buffer.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn rejection_carries_code_and_ids() {
        let output = with_captured_logs(|| {
            log_start_rejected(
                AssignmentId::new(7),
                EmployeeId::new(3),
                &AdmissionError::DependenciesNotMet(DependencyResolution::default()),
            );
        });

        assert!(output.contains(events::START_REJECTED));
        assert!(output.contains("DEPENDENCIES_NOT_MET"));
        assert!(output.contains("assignment-7"));
        assert!(output.contains("WARN"));
    }

    #[test]
    fn storage_failure_logs_at_error() {
        let output = with_captured_logs(|| {
            log_progress_rejected(
                AssignmentId::new(1),
                EmployeeId::new(1),
                &AdmissionError::Storage(StoreError::Unavailable("timeout".into())),
            );
        });

        assert!(output.contains("ERROR"));
        assert!(output.contains("STORAGE_UNAVAILABLE"));
        assert!(output.contains("timeout"));
    }

    #[test]
    fn completion_emits_second_event() {
        let output = with_captured_logs(|| {
            log_progress_accepted(AssignmentId::new(2), EmployeeId::new(1), 90, 100, true);
        });

        assert!(output.contains(events::PROGRESS_ACCEPTED));
        assert!(output.contains(events::COMPLETED));
    }

    #[test]
    fn location_entry_is_logged() {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let position = Position::new(40.7128, -74.006).unwrap();
        let entry = NewLocationLogEntry::new(
            EmployeeId::new(1),
            ProjectId::new(1),
            AssignmentId::new(9),
            &position,
            GpsQuality::Unknown,
            true,
            LogType::TaskStart,
            at,
        )
        .with_id(LocationLogId::new(42));

        let output = with_captured_logs(|| log_location_appended(&entry));

        assert!(output.contains(events::LOCATION_LOGGED));
        assert!(output.contains("location-log-42"));
        assert!(output.contains("assignment-9"));
    }
}

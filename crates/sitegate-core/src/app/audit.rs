//! LocationAuditLog - 位置情報監査ログの書き込み
//!
//! 開始と進捗更新のたびに、その時点の位置とジオフェンス判定結果を
//! LocationLogSink に追記します。
//!
//! # 設計原則
//! - 追記のみ（更新・削除なし）
//! - 割り当ての書き込みが成功した後にだけ呼ばれる
//! - 追記の失敗は遷移を取り消さないが、成功扱いにもしない（呼び出し側へ返す）
//! - timestamp はサーバー時刻（端末の fix 時刻は信用しない）

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{
    GeofenceEvaluation, GpsQuality, LocationLogEntry, LogType, NewLocationLogEntry, Position,
    StoreError, TaskAssignment,
};
use crate::observability;
use crate::ports::LocationLogSink;

#[derive(Clone)]
pub struct LocationAuditLog {
    sink: Arc<dyn LocationLogSink>,
}

impl LocationAuditLog {
    pub fn new(sink: Arc<dyn LocationLogSink>) -> Self {
        Self { sink }
    }

    /// 位置サンプルを 1 件追記
    ///
    /// `evaluation` が無い場合（プロジェクト側にフェンスを評価しなかった場合）は
    /// inside_geofence = false, gps_quality = Unknown として記録します。
    pub async fn record(
        &self,
        assignment: &TaskAssignment,
        position: &Position,
        evaluation: Option<&GeofenceEvaluation>,
        log_type: LogType,
        at: DateTime<Utc>,
    ) -> Result<LocationLogEntry, StoreError> {
        let (inside, quality) = evaluation
            .map(|e| (e.inside_radius, e.gps_quality))
            .unwrap_or((false, GpsQuality::Unknown));

        let entry = NewLocationLogEntry::new(
            assignment.employee_id,
            assignment.project_id,
            assignment.id,
            position,
            quality,
            inside,
            log_type,
            at,
        );

        match self.sink.append(entry).await {
            Ok(stored) => {
                observability::log_location_appended(&stored);
                Ok(stored)
            }
            Err(err) => {
                observability::log_location_append_failed(assignment.id, &err.to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::GeofenceEvaluator;
    use crate::domain::{
        AssignmentId, EmployeeId, GeoPoint, Geofence, ProjectId, SupervisorId, TaskId,
    };
    use crate::impls::InMemoryLocationLog;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};

    fn assignment() -> TaskAssignment {
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 7, 0, 0).unwrap();
        TaskAssignment::new(
            AssignmentId::new(1),
            EmployeeId::new(10),
            ProjectId::new(5),
            TaskId::new(3),
            SupervisorId::new(2),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            at,
        )
    }

    struct FailingSink;

    #[async_trait]
    impl LocationLogSink for FailingSink {
        async fn append(&self, _: NewLocationLogEntry) -> Result<LocationLogEntry, StoreError> {
            Err(StoreError::Unavailable("disk full".into()))
        }
    }

    #[tokio::test]
    async fn records_evaluation_outcome() {
        let sink = Arc::new(InMemoryLocationLog::new());
        let audit = LocationAuditLog::new(sink.clone());
        let fence = Geofence::strict(GeoPoint::new(40.7128, -74.0060).unwrap(), 100.0);
        let position = Position::new(40.7130, -74.0062).unwrap().with_accuracy(75.0);
        let evaluation = GeofenceEvaluator::default().evaluate(&position, &fence);
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();

        let stored = audit
            .record(&assignment(), &position, Some(&evaluation), LogType::TaskStart, at)
            .await
            .unwrap();

        assert!(stored.entry.inside_geofence);
        assert_eq!(stored.entry.gps_quality, GpsQuality::Poor);
        assert_eq!(stored.entry.project_id, ProjectId::new(5));
        assert_eq!(stored.entry.timestamp, at);
        assert_eq!(sink.len().await, 1);
    }

    #[tokio::test]
    async fn server_time_is_recorded() {
        let sink = Arc::new(InMemoryLocationLog::new());
        let audit = LocationAuditLog::new(sink);
        let device = Utc.with_ymd_and_hms(2026, 3, 2, 7, 59, 30).unwrap();
        let server = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let position = Position::new(1.0, 1.0).unwrap().with_timestamp(device);

        let stored = audit
            .record(&assignment(), &position, None, LogType::ProgressUpdate, server)
            .await
            .unwrap();

        assert_eq!(stored.entry.timestamp, server);
        assert!(!stored.entry.inside_geofence);
        assert_eq!(stored.entry.gps_quality, GpsQuality::Unknown);
    }

    #[tokio::test]
    async fn sink_failure_is_returned() {
        let audit = LocationAuditLog::new(Arc::new(FailingSink));
        let position = Position::new(1.0, 1.0).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();

        let err = audit
            .record(&assignment(), &position, None, LogType::TaskStart, at)
            .await
            .unwrap_err();

        assert_eq!(err, StoreError::Unavailable("disk full".into()));
    }
}

//! AssignmentStateMachine - 開始・進捗の状態遷移
//!
//! # start の処理順序
//! 1. 取得と所有者確認（NOT_FOUND / UNAUTHORIZED）
//! 2. status が queued 以外なら ALREADY_STARTED
//! 3. ゲート評価：geofence → dependencies → sequence の順で最初の拒否を返す
//!    （3 つの読み取りは並行に実行）
//! 4. CAS で書き込み。競合したら最新値を読み直して 2 からやり直す
//! 5. 位置があれば TASK_START を監査ログに追記（失敗時は AuditLogUnavailable）
//!
//! # progress の処理順序
//! 1. 取得と所有者確認
//! 2. 進捗ルール（範囲・完了済み・未開始・減少）
//! 3. CAS で書き込み（100% で completed）。競合時は 2 から再判定
//! 4. 位置があれば PROGRESS_UPDATE を追記（ジオフェンスは記録のみで拒否しない）
//!
//! # 学習ポイント
//! - ゲートは読み取り専用、書き込みは CAS の 1 回だけ
//! - 同時に 2 つの start が来ても成功するのは 1 つ（もう一方は ALREADY_STARTED）

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::admission::{DependencyResolver, GeofenceEvaluator, SequenceResolver};
use crate::config::AdmissionConfig;
use crate::domain::{
    AdmissionError, AssignmentId, AssignmentStatus, AssignmentSummary, CoordinateError,
    DependencyResolution, EmployeeId, GeofenceEvaluation, GeofenceReason, LocationLogEntry,
    LogType, Position, SequenceResolution, StartEligibility, StoreError, TaskAssignment,
};
use crate::observability;
use crate::ports::{
    AssignmentStore, CasOutcome, Clock, LocationLogSink, ProjectDirectory, WriteExpectation,
};

use super::audit::LocationAuditLog;

/// Validated start request.
#[derive(Debug, Clone, PartialEq)]
pub struct StartCommand {
    pub assignment_id: AssignmentId,
    pub employee_id: EmployeeId,
    pub position: Option<Position>,
}

impl StartCommand {
    pub fn new(assignment_id: AssignmentId, employee_id: EmployeeId) -> Self {
        Self {
            assignment_id,
            employee_id,
            position: None,
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

/// Validated progress request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressCommand {
    pub assignment_id: AssignmentId,
    pub employee_id: EmployeeId,
    pub progress_percent: u8,
    pub description: String,
    pub position: Option<Position>,
}

impl ProgressCommand {
    pub fn new(
        assignment_id: AssignmentId,
        employee_id: EmployeeId,
        progress_percent: u8,
        description: impl Into<String>,
    ) -> Self {
        Self {
            assignment_id,
            employee_id,
            progress_percent,
            description: description.into(),
            position: None,
        }
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOutcome {
    pub assignment: TaskAssignment,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub geofence: Option<GeofenceEvaluation>,

    /// `None` when no position was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_log: Option<LocationLogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOutcome {
    pub assignment: TaskAssignment,
    pub previous_percent: u8,
    pub completed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_log: Option<LocationLogEntry>,
}

/// Everything the start gates found for one assignment.
struct GateReport {
    geofence_required: bool,
    geofence: Option<GeofenceEvaluation>,
    dependencies: DependencyResolution,
    sequence: SequenceResolution,
}

impl GateReport {
    fn geofence_passes(&self) -> bool {
        !self.geofence_required || self.geofence.is_some_and(|e| e.admissible)
    }

    fn admits(&self) -> bool {
        self.geofence_passes() && self.dependencies.can_proceed && self.sequence.can_proceed
    }

    /// First failing gate, in evaluation order. On success yields the
    /// geofence evaluation, if any.
    fn into_admission(self) -> Result<Option<GeofenceEvaluation>, AdmissionError> {
        if self.geofence_required {
            match self.geofence {
                None => return Err(CoordinateError::Missing.into()),
                Some(e) if !e.admissible => {
                    return Err(AdmissionError::GeofenceValidationFailed(e));
                }
                Some(_) => {}
            }
        }
        if !self.dependencies.can_proceed {
            return Err(AdmissionError::DependenciesNotMet(self.dependencies));
        }
        if !self.sequence.can_proceed {
            return Err(AdmissionError::SequenceValidationFailed(self.sequence));
        }
        Ok(self.geofence)
    }
}

/// AssignmentStateMachine は start / progress / eligibility を提供
///
/// すべてのポートは `Arc<dyn ...>` で保持するので、`Arc<AssignmentStateMachine>`
/// を複数タスクで共有できます。
pub struct AssignmentStateMachine {
    assignments: Arc<dyn AssignmentStore>,
    projects: Arc<dyn ProjectDirectory>,
    audit: LocationAuditLog,
    clock: Arc<dyn Clock>,
    geofence: GeofenceEvaluator,
    dependencies: DependencyResolver,
    sequence: SequenceResolver,
    max_write_attempts: u32,
}

impl AssignmentStateMachine {
    pub fn new(
        assignments: Arc<dyn AssignmentStore>,
        projects: Arc<dyn ProjectDirectory>,
        location_log: Arc<dyn LocationLogSink>,
        clock: Arc<dyn Clock>,
        config: &AdmissionConfig,
    ) -> Self {
        Self {
            dependencies: DependencyResolver::new(assignments.clone()),
            assignments,
            projects,
            audit: LocationAuditLog::new(location_log),
            clock,
            geofence: GeofenceEvaluator::new(config.accuracy),
            sequence: SequenceResolver,
            max_write_attempts: config.max_write_attempts.max(1),
        }
    }

    /// queued → in_progress
    pub async fn start(&self, command: StartCommand) -> Result<StartOutcome, AdmissionError> {
        let result = self.try_start(&command).await;
        match &result {
            Ok(outcome) => observability::log_start_accepted(
                command.assignment_id,
                command.employee_id,
                outcome.geofence.as_ref(),
            ),
            Err(err) => {
                observability::log_start_rejected(command.assignment_id, command.employee_id, err)
            }
        }
        result
    }

    /// 進捗を記録（100% で completed）
    pub async fn progress(
        &self,
        command: ProgressCommand,
    ) -> Result<ProgressOutcome, AdmissionError> {
        let result = self.try_progress(&command).await;
        match &result {
            Ok(outcome) => observability::log_progress_accepted(
                command.assignment_id,
                command.employee_id,
                outcome.previous_percent,
                outcome.assignment.progress_percent,
                outcome.completed,
            ),
            Err(err) => observability::log_progress_rejected(
                command.assignment_id,
                command.employee_id,
                err,
            ),
        }
        result
    }

    /// 書き込みなしで全ゲートを評価
    ///
    /// start と違い最初の拒否で止まらず、すべての阻害要因を返します。
    /// 必須ジオフェンスで位置が無い場合もエラーにせず `can_start = false`。
    pub async fn eligibility(
        &self,
        command: &StartCommand,
    ) -> Result<StartEligibility, AdmissionError> {
        let assignment = self
            .load_owned(command.assignment_id, command.employee_id)
            .await?;
        let gates = self
            .evaluate_gates(&assignment, command.position.as_ref())
            .await?;

        Ok(StartEligibility {
            assignment: AssignmentSummary::from(&assignment),
            can_start: assignment.status == AssignmentStatus::Queued && gates.admits(),
            geofence_required: gates.geofence_required,
            geofence: gates.geofence,
            dependencies: gates.dependencies,
            sequence: gates.sequence,
        })
    }

    async fn try_start(&self, command: &StartCommand) -> Result<StartOutcome, AdmissionError> {
        let mut current = self
            .load_owned(command.assignment_id, command.employee_id)
            .await?;
        let mut attempt = 1;

        loop {
            if current.status != AssignmentStatus::Queued {
                return Err(AdmissionError::AlreadyStarted {
                    assignment_id: current.id,
                    status: current.status,
                });
            }

            let geofence = self
                .evaluate_gates(&current, command.position.as_ref())
                .await?
                .into_admission()?;

            let now = self.clock.now();
            let validated_at = geofence
                .filter(|e| e.admissible)
                .and(command.position)
                .map(|p| p.point);
            let mut next = current.clone();
            next.mark_started(now, validated_at)
                .map_err(|e| AdmissionError::from_transition(current.id, e))?;

            match self
                .assignments
                .compare_and_swap(WriteExpectation::of(&current), next.clone())
                .await?
            {
                CasOutcome::Applied => {
                    let degraded =
                        geofence.filter(|e| e.reason == GeofenceReason::WithinAccuracyBuffer);
                    if let Some(e) = degraded {
                        observability::log_degraded_gps_start(next.id, &e);
                    }
                    let location_log = self
                        .append_location(
                            &next,
                            command.position.as_ref(),
                            geofence.as_ref(),
                            LogType::TaskStart,
                            now,
                        )
                        .await?;
                    return Ok(StartOutcome {
                        assignment: next,
                        geofence,
                        location_log,
                    });
                }
                CasOutcome::Conflict(latest) => {
                    self.record_conflict(current.id, &mut attempt)?;
                    current = latest;
                }
            }
        }
    }

    async fn try_progress(
        &self,
        command: &ProgressCommand,
    ) -> Result<ProgressOutcome, AdmissionError> {
        let mut current = self
            .load_owned(command.assignment_id, command.employee_id)
            .await?;
        current
            .check_progress(command.progress_percent)
            .map_err(|e| AdmissionError::from_transition(current.id, e))?;

        // 記録用の判定のみ。進捗更新はジオフェンスで拒否しない
        let geofence = match &command.position {
            Some(position) => Some(self.evaluate_position(&current, position).await?),
            None => None,
        };

        let mut attempt = 1;
        loop {
            let now = self.clock.now();
            let mut next = current.clone();
            next.apply_progress(command.progress_percent, command.description.clone(), now)
                .map_err(|e| AdmissionError::from_transition(current.id, e))?;

            match self
                .assignments
                .compare_and_swap(WriteExpectation::of(&current), next.clone())
                .await?
            {
                CasOutcome::Applied => {
                    let location_log = self
                        .append_location(
                            &next,
                            command.position.as_ref(),
                            geofence.as_ref(),
                            LogType::ProgressUpdate,
                            now,
                        )
                        .await?;
                    return Ok(ProgressOutcome {
                        previous_percent: current.progress_percent,
                        completed: next.status.is_completed(),
                        assignment: next,
                        location_log,
                    });
                }
                CasOutcome::Conflict(latest) => {
                    self.record_conflict(current.id, &mut attempt)?;
                    current = latest;
                }
            }
        }
    }

    /// 遷移の確定後に位置サンプルを追記
    ///
    /// 追記に失敗しても遷移は取り消さず、AuditLogUnavailable として返す。
    async fn append_location(
        &self,
        assignment: &TaskAssignment,
        position: Option<&Position>,
        geofence: Option<&GeofenceEvaluation>,
        log_type: LogType,
        now: DateTime<Utc>,
    ) -> Result<Option<LocationLogEntry>, AdmissionError> {
        let Some(position) = position else {
            return Ok(None);
        };
        self.audit
            .record(assignment, position, geofence, log_type, now)
            .await
            .map(Some)
            .map_err(|source| AdmissionError::AuditLogUnavailable {
                assignment_id: assignment.id,
                source,
            })
    }

    async fn load_owned(
        &self,
        assignment_id: AssignmentId,
        employee_id: EmployeeId,
    ) -> Result<TaskAssignment, AdmissionError> {
        let assignment = self
            .assignments
            .get(assignment_id)
            .await?
            .ok_or(AdmissionError::NotFound {
                entity: "assignment",
                id: assignment_id.get(),
            })?;
        if !assignment.is_owned_by(employee_id) {
            return Err(AdmissionError::Unauthorized {
                assignment_id,
                employee_id,
            });
        }
        Ok(assignment)
    }

    async fn evaluate_position(
        &self,
        assignment: &TaskAssignment,
        position: &Position,
    ) -> Result<GeofenceEvaluation, AdmissionError> {
        let project = self
            .projects
            .get(assignment.project_id)
            .await?
            .ok_or(AdmissionError::NotFound {
                entity: "project",
                id: assignment.project_id.get(),
            })?;
        Ok(self.geofence.evaluate(position, &project.geofence))
    }

    async fn evaluate_gates(
        &self,
        assignment: &TaskAssignment,
        position: Option<&Position>,
    ) -> Result<GateReport, AdmissionError> {
        let geofence = async {
            match position {
                Some(p) => self.evaluate_position(assignment, p).await.map(Some),
                None => Ok(None),
            }
        };
        let peers = async {
            if assignment.ordered_sequence().is_none() {
                return Ok(Vec::new());
            }
            self.assignments
                .list_for_day(assignment.employee_id, assignment.project_id, assignment.date)
                .await
        };

        let (geofence, dependencies, peers) = tokio::join!(
            geofence,
            self.dependencies.resolve(&assignment.dependencies),
            peers
        );

        Ok(GateReport {
            geofence_required: assignment.geofence_validation.required,
            geofence: geofence?,
            dependencies: dependencies?,
            sequence: self.sequence.resolve(assignment, &peers?),
        })
    }

    fn record_conflict(&self, id: AssignmentId, attempt: &mut u32) -> Result<(), AdmissionError> {
        observability::log_write_conflict(id, *attempt, self.max_write_attempts);
        if *attempt >= self.max_write_attempts {
            return Err(AdmissionError::Storage(StoreError::Unavailable(format!(
                "{id} changed concurrently on each of {attempt} write attempts"
            ))));
        }
        *attempt += 1;
        Ok(())
    }
}

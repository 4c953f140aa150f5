//! AssignmentStore port - 割り当ての正本（source of truth）
//!
//! # 設計原則
//! - 読み取り（get / get_many / list_for_day）は副作用なし
//! - 書き込みは compare_and_swap のみ
//!   - 期待値（revision, status, progress）が一致した時だけ反映する
//!   - 不一致なら現在の永続値を返す（呼び出し側が再判定する）
//! - ドキュメントストアでは条件付き update、RDB では `UPDATE ... WHERE revision = ?`

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{
    AssignmentId, AssignmentStatus, EmployeeId, ProjectId, StoreError, TaskAssignment,
};

/// The persisted values a write was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteExpectation {
    pub status: AssignmentStatus,
    pub progress_percent: u8,
    pub revision: u64,
}

impl WriteExpectation {
    pub fn of(assignment: &TaskAssignment) -> Self {
        Self {
            status: assignment.status,
            progress_percent: assignment.progress_percent,
            revision: assignment.revision,
        }
    }

    pub fn matches(&self, current: &TaskAssignment) -> bool {
        current.revision == self.revision
            && current.status == self.status
            && current.progress_percent == self.progress_percent
    }
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq)]
pub enum CasOutcome {
    Applied,

    /// Someone else wrote first. Carries the record as it is now.
    Conflict(TaskAssignment),
}

/// AssignmentStore は TaskAssignment の読み書き
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn get(&self, id: AssignmentId) -> Result<Option<TaskAssignment>, StoreError>;

    /// Batch lookup. Unknown ids are simply absent from the result.
    async fn get_many(&self, ids: &[AssignmentId]) -> Result<Vec<TaskAssignment>, StoreError>;

    /// All assignments of one worker on one project for one calendar day.
    async fn list_for_day(
        &self,
        employee_id: EmployeeId,
        project_id: ProjectId,
        date: NaiveDate,
    ) -> Result<Vec<TaskAssignment>, StoreError>;

    /// Replace the record with `next` iff the persisted one still matches
    /// `expected`.
    async fn compare_and_swap(
        &self,
        expected: WriteExpectation,
        next: TaskAssignment,
    ) -> Result<CasOutcome, StoreError>;
}

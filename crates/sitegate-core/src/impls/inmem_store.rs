//! InMemoryAssignmentStore / InMemoryProjectDirectory - 開発用・テスト用の正本
//!
//! # 実装詳細
//! - HashMap を tokio::sync::Mutex で保護
//! - compare_and_swap はロック内で「比較 → 置換」を行うので原子的
//! - `set_unavailable(true)` でストレージ障害を再現できる

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{AssignmentId, EmployeeId, Project, ProjectId, StoreError, TaskAssignment};
use crate::ports::{AssignmentStore, CasOutcome, ProjectDirectory, WriteExpectation};

/// In-memory assignment documents.
#[derive(Default)]
pub struct InMemoryAssignmentStore {
    records: Arc<Mutex<HashMap<AssignmentId, TaskAssignment>>>,
    unavailable: AtomicBool,
    reads: AtomicUsize,
}

impl InMemoryAssignmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assignments(assignments: impl IntoIterator<Item = TaskAssignment>) -> Self {
        let records = assignments.into_iter().map(|a| (a.id, a)).collect();
        Self {
            records: Arc::new(Mutex::new(records)),
            ..Self::default()
        }
    }

    /// Insert or overwrite (seeding only; the kernel never calls this).
    pub async fn insert(&self, assignment: TaskAssignment) {
        self.records.lock().await.insert(assignment.id, assignment);
    }

    /// Current persisted copy.
    pub async fn snapshot(&self, id: AssignmentId) -> Option<TaskAssignment> {
        self.records.lock().await.get(&id).cloned()
    }

    /// Simulate the backing store going away.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of read calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store disabled".into()));
        }
        Ok(())
    }

    fn begin_read(&self) -> Result<(), StoreError> {
        self.check_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl AssignmentStore for InMemoryAssignmentStore {
    async fn get(&self, id: AssignmentId) -> Result<Option<TaskAssignment>, StoreError> {
        self.begin_read()?;
        Ok(self.records.lock().await.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[AssignmentId]) -> Result<Vec<TaskAssignment>, StoreError> {
        self.begin_read()?;
        let records = self.records.lock().await;
        Ok(ids.iter().filter_map(|id| records.get(id).cloned()).collect())
    }

    async fn list_for_day(
        &self,
        employee_id: EmployeeId,
        project_id: ProjectId,
        date: NaiveDate,
    ) -> Result<Vec<TaskAssignment>, StoreError> {
        self.begin_read()?;
        let records = self.records.lock().await;
        let mut day: Vec<TaskAssignment> = records
            .values()
            .filter(|a| {
                a.employee_id == employee_id && a.project_id == project_id && a.date == date
            })
            .cloned()
            .collect();
        day.sort_by_key(|a| (a.sequence, a.id));
        Ok(day)
    }

    async fn compare_and_swap(
        &self,
        expected: WriteExpectation,
        next: TaskAssignment,
    ) -> Result<CasOutcome, StoreError> {
        self.check_available()?;
        let mut records = self.records.lock().await;
        let Some(current) = records.get_mut(&next.id) else {
            return Err(StoreError::NotFound {
                entity: "assignment",
                id: next.id.get(),
            });
        };
        if !expected.matches(current) {
            return Ok(CasOutcome::Conflict(current.clone()));
        }
        *current = next;
        Ok(CasOutcome::Applied)
    }
}

/// In-memory project documents (read-mostly).
#[derive(Default)]
pub struct InMemoryProjectDirectory {
    projects: RwLock<HashMap<ProjectId, Project>>,
}

impl InMemoryProjectDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects(projects: impl IntoIterator<Item = Project>) -> Self {
        Self {
            projects: RwLock::new(projects.into_iter().map(|p| (p.id, p)).collect()),
        }
    }

    pub async fn insert(&self, project: Project) {
        self.projects.write().await.insert(project.id, project);
    }
}

#[async_trait]
impl ProjectDirectory for InMemoryProjectDirectory {
    async fn get(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.projects.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssignmentStatus, GeoPoint, Geofence, SupervisorId, TaskId};
    use chrono::{TimeZone, Utc};

    fn assignment(id: u64, employee: u64, sequence: Option<u32>) -> TaskAssignment {
        let mut a = TaskAssignment::new(
            AssignmentId::new(id),
            EmployeeId::new(employee),
            ProjectId::new(1),
            TaskId::new(id),
            SupervisorId::new(99),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 4, 7, 0, 0).unwrap(),
        );
        a.sequence = sequence;
        a
    }

    #[tokio::test]
    async fn get_many_skips_unknown_ids() {
        let store = InMemoryAssignmentStore::with_assignments(vec![assignment(1, 1, None)]);
        let found = store
            .get_many(&[AssignmentId::new(1), AssignmentId::new(2)])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(store.read_count(), 1);
    }

    #[tokio::test]
    async fn list_for_day_filters_and_orders() {
        let store = InMemoryAssignmentStore::with_assignments(vec![
            assignment(3, 1, Some(2)),
            assignment(1, 1, Some(1)),
            assignment(2, 2, Some(1)),
        ]);
        let day = store
            .list_for_day(
                EmployeeId::new(1),
                ProjectId::new(1),
                NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            )
            .await
            .unwrap();
        let ids: Vec<u64> = day.iter().map(|a| a.id.get()).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn cas_applies_only_on_match() {
        let original = assignment(1, 1, None);
        let store = InMemoryAssignmentStore::with_assignments(vec![original.clone()]);

        let mut started = original.clone();
        started.status = AssignmentStatus::InProgress;
        let outcome = store
            .compare_and_swap(WriteExpectation::of(&original), started.clone())
            .await
            .unwrap();
        assert_eq!(outcome, CasOutcome::Applied);

        // Same stale expectation again: conflict, returns the current record.
        let outcome = store
            .compare_and_swap(WriteExpectation::of(&original), started.clone())
            .await
            .unwrap();
        assert_eq!(outcome, CasOutcome::Conflict(started));
    }

    #[tokio::test]
    async fn cas_detects_write_that_kept_status_and_progress() {
        let mut original = assignment(1, 1, None);
        original.status = AssignmentStatus::InProgress;
        original.progress_percent = 50;
        let store = InMemoryAssignmentStore::with_assignments(vec![original.clone()]);

        let mut first = original.clone();
        first.revision += 1;
        let outcome = store
            .compare_and_swap(WriteExpectation::of(&original), first.clone())
            .await
            .unwrap();
        assert_eq!(outcome, CasOutcome::Applied);

        let mut second = original.clone();
        second.revision += 1;
        let outcome = store
            .compare_and_swap(WriteExpectation::of(&original), second)
            .await
            .unwrap();
        assert_eq!(outcome, CasOutcome::Conflict(first));
    }

    #[tokio::test]
    async fn unavailable_store_fails_reads_and_writes() {
        let store = InMemoryAssignmentStore::with_assignments(vec![assignment(1, 1, None)]);
        store.set_unavailable(true);
        assert!(matches!(
            store.get(AssignmentId::new(1)).await,
            Err(StoreError::Unavailable(_))
        ));
        let a = assignment(1, 1, None);
        assert!(store.compare_and_swap(WriteExpectation::of(&a), a).await.is_err());
    }

    #[tokio::test]
    async fn project_directory_lookup() {
        let fence = Geofence::strict(GeoPoint::new(1.0, 1.0).unwrap(), 50.0);
        let dir = InMemoryProjectDirectory::with_projects(vec![Project::new(
            ProjectId::new(1),
            "Tower A",
            fence,
        )]);
        assert!(dir.get(ProjectId::new(1)).await.unwrap().is_some());
        assert!(dir.get(ProjectId::new(2)).await.unwrap().is_none());
    }
}

//! AdmissionBuilder - ポートの組み立て
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use std::sync::Arc;

use crate::config::{AdmissionConfig, ConfigError};
use crate::ports::{AssignmentStore, Clock, LocationLogSink, ProjectDirectory, SystemClock};

use super::state_machine::AssignmentStateMachine;

/// AdmissionBuilder は AssignmentStateMachine を構築
///
/// # 使用例
/// ```ignore
/// let machine = AdmissionBuilder::new()
///     .assignments(store)
///     .projects(directory)
///     .location_log(log)
///     .config(AdmissionConfig::load("sitegate.toml")?)
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - 必須ポート（assignments / projects / location_log）が欠けていれば BuildError
/// - config は build() 時に検証
/// - clock は省略時 SystemClock
#[derive(Default)]
pub struct AdmissionBuilder {
    assignments: Option<Arc<dyn AssignmentStore>>,
    projects: Option<Arc<dyn ProjectDirectory>>,
    location_log: Option<Arc<dyn LocationLogSink>>,
    clock: Option<Arc<dyn Clock>>,
    config: AdmissionConfig,
}

/// BuildError は構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing port: {0}. Call AdmissionBuilder::{0}() before build().")]
    MissingPort(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AdmissionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assignments(mut self, store: Arc<dyn AssignmentStore>) -> Self {
        self.assignments = Some(store);
        self
    }

    pub fn projects(mut self, directory: Arc<dyn ProjectDirectory>) -> Self {
        self.projects = Some(directory);
        self
    }

    pub fn location_log(mut self, sink: Arc<dyn LocationLogSink>) -> Self {
        self.location_log = Some(sink);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: AdmissionConfig) -> Self {
        self.config = config;
        self
    }

    /// 検証して AssignmentStateMachine を生成
    pub fn build(self) -> Result<AssignmentStateMachine, BuildError> {
        self.config.validate()?;
        let assignments = self
            .assignments
            .ok_or(BuildError::MissingPort("assignments"))?;
        let projects = self.projects.ok_or(BuildError::MissingPort("projects"))?;
        let location_log = self
            .location_log
            .ok_or(BuildError::MissingPort("location_log"))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        Ok(AssignmentStateMachine::new(
            assignments,
            projects,
            location_log,
            clock,
            &self.config,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryAssignmentStore, InMemoryLocationLog, InMemoryProjectDirectory};

    fn complete() -> AdmissionBuilder {
        AdmissionBuilder::new()
            .assignments(Arc::new(InMemoryAssignmentStore::new()))
            .projects(Arc::new(InMemoryProjectDirectory::new()))
            .location_log(Arc::new(InMemoryLocationLog::new()))
    }

    #[test]
    fn test_build_success() {
        assert!(complete().build().is_ok());
    }

    #[test]
    fn test_build_missing_projects() {
        let result = AdmissionBuilder::new()
            .assignments(Arc::new(InMemoryAssignmentStore::new()))
            .location_log(Arc::new(InMemoryLocationLog::new()))
            .build();
        assert!(matches!(result, Err(BuildError::MissingPort("projects"))));
    }

    #[test]
    fn test_build_missing_everything_reports_first_port() {
        let result = AdmissionBuilder::new().build();
        assert!(matches!(result, Err(BuildError::MissingPort("assignments"))));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let result = complete()
            .config(AdmissionConfig {
                max_write_attempts: 0,
                ..AdmissionConfig::default()
            })
            .build();
        assert!(matches!(result, Err(BuildError::Config(_))));
    }
}

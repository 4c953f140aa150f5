//! sitegate-core
//!
//! Admission kernel for field-service task assignments: decides whether a
//! worker may start an assignment (on site, prerequisites done, earlier
//! assignments of the day done) and records progress until completion.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, assignment, geo, policy, decision, errors）
//! - **ports**: 抽象化レイヤー（AssignmentStore, ProjectDirectory, LocationLogSink, Clock, IdGenerator）
//! - **admission**: 開始ゲート（geofence, dependency, sequence）
//! - **app**: 状態遷移（AssignmentStateMachine, AdmissionBuilder, api）
//! - **impls**: InMemory 実装（開発用・テスト用）
//! - **config**: TOML 設定
//! - **observability**: 構造化監査イベント

pub mod admission;
pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;

pub use app::{AdmissionBuilder, AssignmentStateMachine};
pub use config::AdmissionConfig;

//! App - アプリケーション層
//!
//! このモジュールは、ports と admission のゲートを組み合わせて
//! 割り当ての状態遷移を実装します。
//!
//! # 主要コンポーネント
//! - **AssignmentStateMachine**: start / progress / eligibility
//! - **AdmissionBuilder**: ポートのワイヤリングと起動時検証
//! - **LocationAuditLog**: 位置情報監査ログへの追記
//! - **api**: リクエスト検証とレスポンス封筒

pub mod api;
pub mod audit;
pub mod builder;
pub mod state_machine;

// 主要な型を再エクスポート
pub use self::api::{
    ApiResponse, ErrorBody, PositionInput, ProgressRequest, RequestError, StartRequest, codes,
    handle_check, handle_progress, handle_start,
};
pub use self::audit::LocationAuditLog;
pub use self::builder::{AdmissionBuilder, BuildError};
pub use self::state_machine::{
    AssignmentStateMachine, ProgressCommand, ProgressOutcome, StartCommand, StartOutcome,
};

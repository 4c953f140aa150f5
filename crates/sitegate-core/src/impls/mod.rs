//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の InMemory 実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryAssignmentStore**: CAS 付きの割り当てストア
//! - **InMemoryProjectDirectory**: プロジェクト参照
//! - **InMemoryLocationLog**: 追記専用の位置情報ログ
//!
//! # 本番用実装
//! ドキュメントストア実装は HTTP 層と同じく別クレートに置く想定です。

pub mod inmem_location_log;
pub mod inmem_store;

// 主要な型を再エクスポート
pub use self::inmem_location_log::InMemoryLocationLog;
pub use self::inmem_store::{InMemoryAssignmentStore, InMemoryProjectDirectory};

//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部の永続化層（ドキュメントストア）へのインターフェースを提供し、
//! 実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - 割り当ての正本は AssignmentStore（状態遷移は CAS でのみ書き込む）
//! - プロジェクトは読み取り専用
//! - 位置情報ログは追記専用

pub mod assignment_store;
pub mod clock;
pub mod id_generator;
pub mod location_log;
pub mod project_directory;

// 主要な trait を再エクスポート
pub use self::assignment_store::{AssignmentStore, CasOutcome, WriteExpectation};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, SequentialIdGenerator};
pub use self::location_log::LocationLogSink;
pub use self::project_directory::ProjectDirectory;

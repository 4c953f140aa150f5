//! LocationLogSink port - 位置情報監査ログ（追記専用）
//!
//! # 設計原則
//! - append のみ（更新・削除・検索はこのクレートから行わない）
//! - ID は sink 側で払い出す（IdGenerator または永続化層の自動採番）

use async_trait::async_trait;

use crate::domain::{LocationLogEntry, NewLocationLogEntry, StoreError};

#[async_trait]
pub trait LocationLogSink: Send + Sync {
    /// Persist one entry and return it with its allocated id.
    async fn append(&self, entry: NewLocationLogEntry) -> Result<LocationLogEntry, StoreError>;
}

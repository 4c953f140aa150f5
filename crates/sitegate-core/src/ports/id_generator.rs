//! IdGenerator port - 監査ログ ID 生成の抽象化
//!
//! 「現在の最大 ID + 1」を読み直す方式は並行 append で衝突するため使いません。
//! ID は単調増加カウンタ（または永続化層の自動採番）から払い出します。

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::LocationLogId;

/// IdGenerator は LocationLogId を払い出す
///
/// # Thread Safety
/// - `Send + Sync` を要求（複数タスクから同時に呼ばれる）
/// - 同じ ID を二度返してはならない
pub trait IdGenerator: Send + Sync {
    fn next_location_log_id(&self) -> LocationLogId;
}

/// SequentialIdGenerator は AtomicU64 による単調増加カウンタ
///
/// `fetch_add` 一回で採番するので、ロックなしで並行 append に耐えます。
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// 1 から採番を開始
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// 既存データの続きから採番する場合（起動時に一度だけ設定）
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first.max(1)),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_location_log_id(&self) -> LocationLogId {
        LocationLogId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

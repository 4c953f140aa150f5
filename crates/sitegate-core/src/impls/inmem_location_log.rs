//! InMemoryLocationLog - 開発用の追記専用ログ
//!
//! ID は注入された IdGenerator から払い出す（「最大 ID + 1」は使わない）。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{LocationLogEntry, NewLocationLogEntry, StoreError};
use crate::ports::{IdGenerator, LocationLogSink, SequentialIdGenerator};

pub struct InMemoryLocationLog {
    entries: Mutex<Vec<LocationLogEntry>>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryLocationLog {
    pub fn new() -> Self {
        Self::with_id_generator(Arc::new(SequentialIdGenerator::new()))
    }

    pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            ids,
        }
    }

    /// All entries in append order.
    pub async fn entries(&self) -> Vec<LocationLogEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for InMemoryLocationLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationLogSink for InMemoryLocationLog {
    async fn append(&self, entry: NewLocationLogEntry) -> Result<LocationLogEntry, StoreError> {
        // 採番と追記を同じロック内で行い、ID 順 = 追記順を保つ
        let mut entries = self.entries.lock().await;
        let persisted = entry.with_id(self.ids.next_location_log_id());
        entries.push(persisted.clone());
        Ok(persisted)
    }
}

use dashmap::DashMap;

use crate::core::SessionId;
use crate::core::reading::{NormalizedReading, SensorKind};

use super::{ReadingStore, StoreError};

/// 进程内读数存储: 按会话保存完整历史和各类型最新值.
/// 外部数据库协作方通过 ReadingStore 接口接入时可替换本实现.
#[derive(Default)]
pub struct MemoryStore {
    history: DashMap<SessionId, Vec<NormalizedReading>>,
    latest: DashMap<SessionId, DashMap<SensorKind, NormalizedReading>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, session_id: SessionId) -> Option<Vec<NormalizedReading>> {
        self.history.get(&session_id).map(|v| v.value().clone())
    }

    pub fn latest(&self, session_id: SessionId, kind: SensorKind) -> Option<NormalizedReading> {
        let guard = self.latest.get(&session_id)?;
        guard.get(&kind).map(|v| v.value().clone())
    }

    pub fn count(&self, session_id: SessionId) -> usize {
        self.history.get(&session_id).map(|v| v.len()).unwrap_or(0)
    }

    pub fn count_kind(&self, session_id: SessionId, kind: SensorKind) -> usize {
        self.history
            .get(&session_id)
            .map(|v| v.iter().filter(|r| r.kind == kind).count())
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl ReadingStore for MemoryStore {
    async fn insert(&self, reading: &NormalizedReading) -> Result<(), StoreError> {
        self.history
            .entry(reading.session_id)
            .or_default()
            .push(reading.clone());
        self.latest
            .entry(reading.session_id)
            .or_default()
            .insert(reading.kind, reading.clone());
        Ok(())
    }
}

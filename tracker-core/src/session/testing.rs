use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::json;

use crate::core::reading::{NormalizedReading, RawReading, SensorKind};
use crate::core::source::{SensorSource, SourceSet};
use crate::sensor::{SensorError, SensorFetch};
use crate::sink::{PublishError, ReadingPublisher, ReadingStore, StoreError};

use super::registry::PollerDeps;

pub(crate) fn source_set(fast_ms: u64, slow_ms: u64) -> SourceSet {
    let fast = Duration::from_millis(fast_ms);
    let slow = Duration::from_millis(slow_ms);
    SourceSet {
        fast: SensorSource {
            kind: SensorKind::Position,
            address: String::from("http://sensors/gps"),
            cadence: fast,
        },
        slow: vec![
            SensorSource {
                kind: SensorKind::Temperature,
                address: String::from("http://sensors/temp"),
                cadence: slow,
            },
            SensorSource {
                kind: SensorKind::Battery,
                address: String::from("http://sensors/battery"),
                cadence: slow,
            },
        ],
        slow_cadence: slow,
    }
}

pub(crate) fn deps(
    fetcher: Arc<dyn SensorFetch>,
    store: Arc<dyn ReadingStore>,
    publisher: Arc<dyn ReadingPublisher>,
) -> PollerDeps {
    PollerDeps {
        fetcher,
        store,
        publisher,
    }
}

/// 按类型返回固定负载并计数的假采集端, 可指定某类固定失败
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    pub(crate) fail_kind: Option<SensorKind>,
    pub(crate) position: AtomicU64,
    pub(crate) temperature: AtomicU64,
    pub(crate) battery: AtomicU64,
}

impl ScriptedFetcher {
    pub(crate) fn count(&self, kind: SensorKind) -> u64 {
        match kind {
            SensorKind::Position => self.position.load(Ordering::Acquire),
            SensorKind::Temperature => self.temperature.load(Ordering::Acquire),
            SensorKind::Battery => self.battery.load(Ordering::Acquire),
        }
    }
}

#[async_trait::async_trait]
impl SensorFetch for ScriptedFetcher {
    async fn fetch(&self, source: &SensorSource) -> Result<RawReading, SensorError> {
        match source.kind {
            SensorKind::Position => self.position.fetch_add(1, Ordering::AcqRel),
            SensorKind::Temperature => self.temperature.fetch_add(1, Ordering::AcqRel),
            SensorKind::Battery => self.battery.fetch_add(1, Ordering::AcqRel),
        };
        if self.fail_kind == Some(source.kind) {
            return Err(SensorError::Protocol(String::from("模拟协议错误")));
        }
        let value = match source.kind {
            SensorKind::Position => json!({"lat": 48.25, "lon": 4.02, "ts": "2024-01-01T00:00:00Z"}),
            SensorKind::Temperature => {
                json!({"temperature": 21.5, "timestamp": "2024-01-01T00:00:00Z"})
            }
            SensorKind::Battery => json!({"battery": 87, "timestamp": "2024-01-01T00:00:00Z"}),
        };
        Ok(RawReading(value))
    }
}

/// 记录发布尝试次数的假发布端
#[derive(Default)]
pub(crate) struct CountingPublisher {
    pub(crate) published: AtomicU64,
    pub(crate) fail: bool,
}

#[async_trait::async_trait]
impl ReadingPublisher for CountingPublisher {
    async fn publish(&self, _reading: &NormalizedReading) -> Result<(), PublishError> {
        self.published.fetch_add(1, Ordering::AcqRel);
        if self.fail {
            return Err(PublishError::Send(String::from("模拟发布失败")));
        }
        Ok(())
    }
}

/// 总是拒绝写入的存储
pub(crate) struct FailingStore;

#[async_trait::async_trait]
impl ReadingStore for FailingStore {
    async fn insert(&self, _reading: &NormalizedReading) -> Result<(), StoreError> {
        Err(StoreError::Insert(String::from("模拟存储失败")))
    }
}

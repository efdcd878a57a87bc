use std::time::Duration;

use serde::Deserialize;
use tokio::fs;

use crate::core::SessionId;
use crate::core::reading::SensorKind;
use crate::core::source::{SensorSource, SourceSet};

const DEFAULT_FAST_INTERVAL_MS: u64 = 10_000;
const DEFAULT_SLOW_INTERVAL_MS: u64 = 60_000;
const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    ReadFileError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseJsonError(#[from] serde_json::Error),
    #[error("{0}不能为空")]
    ValueNotNone(String),
    #[error("快速源间隔({0}ms)不能大于慢速源间隔({1}ms)")]
    CadenceOrder(u64, u64),
    #[error("轮询间隔不能为0ms")]
    CadenceZero,
}

#[derive(Debug)]
pub struct Configuration {
    pub project: Project,
}

impl Configuration {
    pub async fn new(path: String) -> Result<Self, ConfigError> {
        let bytes = fs::read(path.as_str()).await?;
        let project = serde_json::from_slice::<Project>(strip_prelude(&bytes))?;
        Ok(Self { project })
    }
}

// 部分编辑器导出的json带UTF-8 BOM或前导空白, 解析前剥掉
fn strip_prelude(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let start = bytes
        .iter()
        .position(|b| !matches!(b, b' ' | b'\n' | b'\r' | b'\t'))
        .unwrap_or(bytes.len());
    &bytes[start..]
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project: Option<String>,
    pub sensors: Option<Sensors>,
    pub fast_interval_ms: Option<u64>,
    pub slow_interval_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub shutdown_timeout_ms: Option<u64>,
    pub mqtt: Option<Mqtt>,
    pub sessions: Option<Vec<SessionId>>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Sensors {
    pub position: Option<String>,
    pub temperature: Option<String>,
    pub battery: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Mqtt {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub client_id: Option<String>,
}

/// 校验后的引擎配置
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub sources: SourceSet,
    pub fetch_timeout: Duration,
    pub shutdown_timeout: Duration,
    pub sessions: Vec<SessionId>,
}

impl TryFrom<Project> for EngineConfig {
    type Error = ConfigError;

    fn try_from(value: Project) -> Result<Self, Self::Error> {
        let Some(sensors) = value.sensors else {
            return Err(ConfigError::ValueNotNone(String::from("传感器端点")));
        };
        let Some(position) = sensors.position else {
            return Err(ConfigError::ValueNotNone(String::from("位置端点")));
        };
        let Some(temperature) = sensors.temperature else {
            return Err(ConfigError::ValueNotNone(String::from("温度端点")));
        };
        let Some(battery) = sensors.battery else {
            return Err(ConfigError::ValueNotNone(String::from("电量端点")));
        };
        let fast_ms = value.fast_interval_ms.unwrap_or(DEFAULT_FAST_INTERVAL_MS);
        let slow_ms = value.slow_interval_ms.unwrap_or(DEFAULT_SLOW_INTERVAL_MS);
        // tokio::time::interval 不接受0周期, 必须在加载期拒绝
        if fast_ms == 0 || slow_ms == 0 {
            return Err(ConfigError::CadenceZero);
        }
        if fast_ms > slow_ms {
            return Err(ConfigError::CadenceOrder(fast_ms, slow_ms));
        }
        let fast_cadence = Duration::from_millis(fast_ms);
        let slow_cadence = Duration::from_millis(slow_ms);
        let sources = SourceSet {
            fast: SensorSource {
                kind: SensorKind::Position,
                address: position,
                cadence: fast_cadence,
            },
            slow: vec![
                SensorSource {
                    kind: SensorKind::Temperature,
                    address: temperature,
                    cadence: slow_cadence,
                },
                SensorSource {
                    kind: SensorKind::Battery,
                    address: battery,
                    cadence: slow_cadence,
                },
            ],
            slow_cadence,
        };
        Ok(EngineConfig {
            sources,
            fetch_timeout: Duration::from_millis(value.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
            shutdown_timeout: Duration::from_millis(
                value
                    .shutdown_timeout_ms
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_MS),
            ),
            sessions: value.sessions.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
}

impl From<Option<Mqtt>> for MqttConfig {
    fn from(value: Option<Mqtt>) -> Self {
        let mqtt = value.unwrap_or_default();
        MqttConfig {
            host: mqtt.host.unwrap_or_else(|| String::from("mosquitto")),
            port: mqtt.port.unwrap_or(1883),
            client_id: mqtt.client_id.unwrap_or_else(|| String::from("tracker-backend")),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn project(json: &str) -> Project {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_strip_prelude() {
        assert_eq!(strip_prelude(b"\xEF\xBB\xBF\n {\"a\":1}"), b"{\"a\":1}");
        assert_eq!(strip_prelude(b"{}"), b"{}");
    }

    #[test]
    fn test_missing_endpoint_rejected() {
        let p = project(r#"{"sensors": {"position": "http://simulator/gps"}}"#);
        assert!(matches!(
            EngineConfig::try_from(p),
            Err(ConfigError::ValueNotNone(_))
        ));
    }

    #[test]
    fn test_cadence_order_rejected() {
        let p = project(
            r#"{
                "sensors": {
                    "position": "http://simulator/gps",
                    "temperature": "http://simulator/temp",
                    "battery": "http://simulator/battery"
                },
                "fastIntervalMs": 5000,
                "slowIntervalMs": 1000
            }"#,
        );
        assert!(matches!(
            EngineConfig::try_from(p),
            Err(ConfigError::CadenceOrder(5000, 1000))
        ));
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let p = project(
            r#"{
                "sensors": {
                    "position": "http://simulator/gps",
                    "temperature": "http://simulator/temp",
                    "battery": "http://simulator/battery"
                },
                "fastIntervalMs": 0,
                "slowIntervalMs": 0
            }"#,
        );
        assert!(matches!(
            EngineConfig::try_from(p),
            Err(ConfigError::CadenceZero)
        ));
    }

    #[test]
    fn test_full_config() {
        let p = project(
            r#"{
                "project": "tracking",
                "sensors": {
                    "position": "http://simulator/gps",
                    "temperature": "http://simulator/temp",
                    "battery": "http://simulator/battery"
                },
                "fastIntervalMs": 1000,
                "slowIntervalMs": 5000,
                "timeoutMs": 2000,
                "mqtt": {"host": "localhost", "port": 1884},
                "sessions": [1, 2]
            }"#,
        );
        let mqtt = MqttConfig::from(p.mqtt.clone());
        let engine = EngineConfig::try_from(p).unwrap();
        assert_eq!(engine.sources.fast.kind, SensorKind::Position);
        assert_eq!(engine.sources.fast_cadence(), Duration::from_secs(1));
        assert_eq!(engine.sources.slow.len(), 2);
        assert_eq!(engine.sources.slow_cadence, Duration::from_secs(5));
        assert_eq!(engine.fetch_timeout, Duration::from_secs(2));
        assert_eq!(engine.sessions, vec![1, 2]);
        assert_eq!(mqtt.host, "localhost");
        assert_eq!(mqtt.port, 1884);
        assert_eq!(mqtt.client_id, "tracker-backend");
    }

    #[test]
    fn test_defaults() {
        let p = project(
            r#"{
                "sensors": {
                    "position": "http://simulator/gps",
                    "temperature": "http://simulator/temp",
                    "battery": "http://simulator/battery"
                }
            }"#,
        );
        let engine = EngineConfig::try_from(p).unwrap();
        assert_eq!(engine.sources.fast_cadence(), Duration::from_secs(10));
        assert_eq!(engine.sources.slow_cadence, Duration::from_secs(60));
        assert!(engine.sessions.is_empty());
        let mqtt = MqttConfig::from(None);
        assert_eq!(mqtt.host, "mosquitto");
        assert_eq!(mqtt.port, 1883);
    }
}

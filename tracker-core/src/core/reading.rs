use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Position,
    Temperature,
    Battery,
}

impl SensorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Position => "position",
            SensorKind::Temperature => "temperature",
            SensorKind::Battery => "battery",
        }
    }

    /// 该类型读数必须包含的数值字段
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            SensorKind::Position => &["lat", "lon"],
            SensorKind::Temperature => &["temperature"],
            SensorKind::Battery => &["battery"],
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 传感器返回的原始负载, 未经校验, 可能畸形
#[derive(Debug, Clone)]
pub struct RawReading(pub serde_json::Value);

/// 规范化后的标准读数. 时间戳与所有必需数值字段保证存在且有限.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedReading {
    pub session_id: SessionId,
    pub kind: SensorKind,
    pub timestamp: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, f64>,
}

impl NormalizedReading {
    /// 发布话题: /tracking/{session}/{kind}
    pub fn topic(&self) -> String {
        format!("/tracking/{}/{}", self.session_id, self.kind)
    }

    pub fn field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied()
    }
}

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::SessionId;
use crate::core::reading::{NormalizedReading, RawReading, SensorKind};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DecodeError {
    #[error("缺少字段: {0}")]
    MissingField(String),
    #[error("字段{0}不是有效数值: {1}")]
    InvalidNumeric(String, String),
}

/// 将原始负载规范化为标准读数. 纯函数, 缺失字段直接失败, 不做默认值填充.
///
/// 时间戳接受 ts 和 timestamp 两种写法, 统一映射到标准字段;
/// 数值字段接受数字或数字字符串, 统一转为有限的 f64.
pub fn normalize(
    session_id: SessionId,
    kind: SensorKind,
    raw: &RawReading,
) -> Result<NormalizedReading, DecodeError> {
    let Some(object) = raw.0.as_object() else {
        return Err(DecodeError::MissingField(String::from("payload")));
    };
    let timestamp = object
        .get("ts")
        .and_then(Value::as_str)
        .or_else(|| object.get("timestamp").and_then(Value::as_str))
        .ok_or_else(|| DecodeError::MissingField(String::from("timestamp")))?
        .to_string();
    let mut fields = BTreeMap::new();
    for name in kind.required_fields() {
        let value = object
            .get(*name)
            .ok_or_else(|| DecodeError::MissingField(String::from(*name)))?;
        fields.insert(String::from(*name), coerce_numeric(name, value)?);
    }
    Ok(NormalizedReading {
        session_id,
        kind,
        timestamp,
        fields,
    })
}

fn coerce_numeric(name: &str, value: &Value) -> Result<f64, DecodeError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(DecodeError::InvalidNumeric(
            String::from(name),
            value.to_string(),
        )),
    }
}

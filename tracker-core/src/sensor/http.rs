use std::time::Duration;

use crate::core::reading::RawReading;
use crate::core::source::SensorSource;

use super::{SensorError, SensorFetch};

/// HTTP 传感器客户端. 每次调用新建传输上下文, 调用之间不保留连接状态,
/// 以故障隔离换连接复用; 请求时长由自身超时约束.
pub struct HttpSensorClient {
    timeout: Duration,
}

impl HttpSensorClient {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait::async_trait]
impl SensorFetch for HttpSensorClient {
    async fn fetch(&self, source: &SensorSource) -> Result<RawReading, SensorError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| SensorError::Transport(e.to_string()))?;
        let response = client
            .get(source.address.as_str())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SensorError::Timeout
                } else {
                    SensorError::Transport(e.to_string())
                }
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(SensorError::Protocol(format!("响应状态码: {}", status)));
        }
        let value = response.json::<serde_json::Value>().await.map_err(|e| {
            if e.is_timeout() {
                SensorError::Timeout
            } else {
                SensorError::Protocol(format!("无法解析响应体: {}", e))
            }
        })?;
        Ok(RawReading(value))
    }
}

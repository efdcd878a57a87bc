pub mod http;

pub use http::HttpSensorClient;

use crate::core::reading::RawReading;
use crate::core::source::SensorSource;

#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    #[error("传输错误: {0}")]
    Transport(String),
    #[error("请求超时")]
    Timeout,
    #[error("协议错误: {0}")]
    Protocol(String),
}

/// 单次请求/响应交换的传感器采集端
#[async_trait::async_trait]
pub trait SensorFetch: Send + Sync {
    async fn fetch(&self, source: &SensorSource) -> Result<RawReading, SensorError>;
}

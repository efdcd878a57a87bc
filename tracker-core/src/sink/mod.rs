pub mod memory;
pub mod mqtt;

pub use memory::MemoryStore;
pub use mqtt::MqttPublisher;

use crate::core::reading::NormalizedReading;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("存储写入失败: {0}")]
    Insert(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("消息发布失败: {0}")]
    Send(String),
    #[error("负载序列化失败: {0}")]
    Encode(#[from] serde_json::Error),
}

/// 记录系统. 同一会话内串行调用, 跨会话并发安全.
#[async_trait::async_trait]
pub trait ReadingStore: Send + Sync {
    async fn insert(&self, reading: &NormalizedReading) -> Result<(), StoreError>;
}

/// 尽力而为的发布端, 失败只记录不重试
#[async_trait::async_trait]
pub trait ReadingPublisher: Send + Sync {
    async fn publish(&self, reading: &NormalizedReading) -> Result<(), PublishError>;
}

use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tokio::time;
use tracing::warn;

use crate::config::MqttConfig;
use crate::core::reading::NormalizedReading;

use super::{PublishError, ReadingPublisher};

/// MQTT 发布端, QoS0 不保证送达.
/// 连接与重连由后台事件循环驱动, 失败只记录后重试.
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    pub fn new(config: &MqttConfig) -> Self {
        let mut options = MqttOptions::new(
            config.client_id.as_str(),
            config.host.as_str(),
            config.port,
        );
        options.set_keep_alive(Duration::from_secs(60));
        let (client, event_loop) = AsyncClient::new(options, 16);
        tokio::spawn(drive(event_loop));
        Self { client }
    }

    pub async fn disconnect(&self) {
        if let Err(err) = self.client.disconnect().await {
            warn!("MQTT断开失败: {}", err);
        }
    }
}

async fn drive(mut event_loop: EventLoop) {
    loop {
        if let Err(err) = event_loop.poll().await {
            warn!("MQTT连接错误: {}", err);
            time::sleep(Duration::from_secs(1)).await;
        }
    }
}

#[async_trait::async_trait]
impl ReadingPublisher for MqttPublisher {
    async fn publish(&self, reading: &NormalizedReading) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(reading)?;
        self.client
            .publish(reading.topic(), QoS::AtMostOnce, false, payload)
            .await
            .map_err(|e| PublishError::Send(e.to_string()))
    }
}

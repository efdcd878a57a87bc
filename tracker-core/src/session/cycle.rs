use tracing::{debug, warn};

use crate::core::SessionId;
use crate::core::source::SensorSource;
use crate::decode::{self, DecodeError};
use crate::sensor::SensorError;
use crate::sink::StoreError;

use super::registry::PollerDeps;

/// 单个源在一个周期内的失败, 按阶段分型.
/// 只在周期边界记录, 不会上抛到轮询循环.
#[derive(Debug, thiserror::Error)]
pub(super) enum PollError {
    #[error("采集失败: {0}")]
    Sensor(#[from] SensorError),
    #[error("规范化失败: {0}")]
    Decode(#[from] DecodeError),
    #[error("持久化失败: {0}")]
    Store(#[from] StoreError),
}

/// 一次轮询周期: 对每个到期的源执行 采集->规范化->持久化->发布.
/// 单个源任一阶段失败只记录, 不影响同周期其它源.
pub(super) async fn run_cycle(session_id: SessionId, due: &[&SensorSource], deps: &PollerDeps) {
    for source in due {
        if let Err(err) = poll_source(session_id, source, deps).await {
            warn!("[session {}] {}源本周期失败: {}", session_id, source.kind, err);
        }
    }
}

async fn poll_source(
    session_id: SessionId,
    source: &SensorSource,
    deps: &PollerDeps,
) -> Result<(), PollError> {
    let raw = deps.fetcher.fetch(source).await?;
    let reading = decode::normalize(session_id, source.kind, &raw)?;
    // 先持久化再发布: 存储是记录系统, 发布允许丢失
    deps.store.insert(&reading).await?;
    if let Err(err) = deps.publisher.publish(&reading).await {
        warn!("[session {}] {}读数发布失败: {}", session_id, source.kind, err);
    }
    debug!("[session {}] {} = {:?}", session_id, source.kind, reading.fields);
    Ok(())
}

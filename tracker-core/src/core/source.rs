use std::time::Duration;

use crate::core::reading::SensorKind;

/// 远端传感器端点描述, 进程启动时确定, 之后不可变
#[derive(Debug, Clone)]
pub struct SensorSource {
    pub kind: SensorKind,
    pub address: String,
    pub cadence: Duration,
}

/// 所有会话共享的源集合: 一个快速源加若干共用慢速节奏的慢速源
#[derive(Debug, Clone)]
pub struct SourceSet {
    pub fast: SensorSource,
    pub slow: Vec<SensorSource>,
    pub slow_cadence: Duration,
}

impl SourceSet {
    /// 轮询循环的基准间隔
    pub fn fast_cadence(&self) -> Duration {
        self.fast.cadence
    }
}

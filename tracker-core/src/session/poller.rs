use std::sync::Arc;
use std::sync::atomic::AtomicU8;

use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::core::SessionId;
use crate::core::source::{SensorSource, SourceSet};

use super::cycle;
use super::registry::PollerDeps;
use super::state::{PollerState, store_state};

/// 单个会话的轮询循环: 以快速节奏驱动, 慢速源在同一循环内按经过时间门控.
/// 同一会话的周期严格串行, last_slow 只在本任务上变更.
pub(super) struct SessionRunner {
    session_id: SessionId,
    sources: Arc<SourceSet>,
    deps: Arc<PollerDeps>,
    state: Arc<AtomicU8>,
    stop_rx: watch::Receiver<bool>,
}

impl SessionRunner {
    pub(super) fn new(
        session_id: SessionId,
        sources: Arc<SourceSet>,
        deps: Arc<PollerDeps>,
        state: Arc<AtomicU8>,
        stop_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            session_id,
            sources,
            deps,
            state,
            stop_rx,
        }
    }

    fn stop_requested(stop_rx: &watch::Receiver<bool>) -> bool {
        *stop_rx.borrow()
    }

    pub(super) async fn run(&self) {
        let mut stop_rx = self.stop_rx.clone();
        let mut ticker = time::interval(self.sources.fast_cadence());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // None 表示从未轮询过慢速源, 保证首个周期包含它们
        let mut last_slow: Option<Instant> = None;
        loop {
            if Self::stop_requested(&stop_rx) {
                break;
            }
            tokio::select! {
                _ = stop_rx.changed() => {
                    if Self::stop_requested(&stop_rx) {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let due = self.due_sources(&mut last_slow, Instant::now());
                    cycle::run_cycle(self.session_id, &due, &self.deps).await;
                }
            }
        }
        store_state(self.session_id, &self.state, PollerState::Terminated);
    }

    /// 本周期到期的源: 快速源总是到期, 慢速源满足
    /// now - last_slow >= slow_cadence 时到期并重置门控时刻
    fn due_sources<'a>(
        &'a self,
        last_slow: &mut Option<Instant>,
        now: Instant,
    ) -> Vec<&'a SensorSource> {
        let mut due = vec![&self.sources.fast];
        let slow_due = match *last_slow {
            None => true,
            Some(at) => now.duration_since(at) >= self.sources.slow_cadence,
        };
        if slow_due && !self.sources.slow.is_empty() {
            *last_slow = Some(now);
            due.extend(self.sources.slow.iter());
        }
        due
    }
}

use std::sync::Arc;
use std::sync::atomic::AtomicU8;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Mutex, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time;
use tracing::{debug, error, info};

use crate::core::SessionId;
use crate::core::source::SourceSet;
use crate::sensor::SensorFetch;
use crate::sink::{ReadingPublisher, ReadingStore};

use super::poller::SessionRunner;
use super::state::{self, PollerState};

/// 轮询循环依赖的外部协作方
pub struct PollerDeps {
    pub fetcher: Arc<dyn SensorFetch>,
    pub store: Arc<dyn ReadingStore>,
    pub publisher: Arc<dyn ReadingPublisher>,
}

/// 一个会话轮询任务的活动状态, 由注册表独占持有直到任务终止
struct PollerHandle {
    session_id: SessionId,
    state: Arc<AtomicU8>,
    stop_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PollerHandle {
    fn cancel(&self) {
        let _ = self.stop_tx.send(true);
        if state::cas_state(
            &self.state,
            PollerState::Running,
            PollerState::CancelRequested,
        ) {
            info!(
                "[session {}] {} -> {}",
                self.session_id,
                PollerState::Running,
                PollerState::CancelRequested
            );
        }
    }

    async fn join(&self) {
        let mut guard = self.task.lock().await;
        if let Some(handle) = guard.take() {
            if let Err(err) = handle.await {
                error!("[session {}] 轮询任务异常退出: {}", self.session_id, err);
            }
        }
    }
}

/// 进程级注册表: 会话 -> 轮询任务, 保证每会话至多一个存活循环.
/// start/stop/stop_all 是外部生命周期事件的唯一入口.
pub struct PollerRegistry {
    pollers: Arc<DashMap<SessionId, Arc<PollerHandle>>>,
    sources: Arc<SourceSet>,
    deps: Arc<PollerDeps>,
    shutdown_timeout: Duration,
}

impl PollerRegistry {
    pub fn new(sources: SourceSet, deps: PollerDeps, shutdown_timeout: Duration) -> Self {
        Self {
            pollers: Arc::new(DashMap::new()),
            sources: Arc::new(sources),
            deps: Arc::new(deps),
            shutdown_timeout,
        }
    }

    /// 为会话启动轮询任务. 已有存活任务时幂等返回;
    /// entry 持有分片锁, 并发 start 不可能产生重复循环.
    pub fn start(&self, session_id: SessionId) {
        match self.pollers.entry(session_id) {
            Entry::Occupied(_) => {
                debug!("[session {}] 轮询任务已存在, 忽略重复启动", session_id);
            }
            Entry::Vacant(vacant) => {
                let state = Arc::new(AtomicU8::new(PollerState::Running as u8));
                let (stop_tx, stop_rx) = watch::channel(false);
                let runner = SessionRunner::new(
                    session_id,
                    Arc::clone(&self.sources),
                    Arc::clone(&self.deps),
                    Arc::clone(&state),
                    stop_rx,
                );
                let handle = tokio::spawn(async move { runner.run().await });
                vacant.insert(Arc::new(PollerHandle {
                    session_id,
                    state,
                    stop_tx,
                    task: Mutex::new(Some(handle)),
                }));
                info!("[session {}] 轮询任务已启动", session_id);
            }
        }
    }

    /// 停止会话的轮询任务并等待其完全退出; 无任务时直接返回.
    /// 注册表条目在任务确认终止后才移除, 期间并发的 start 是幂等空操作,
    /// 同一会话不可能出现两个并存的循环.
    pub async fn stop(&self, session_id: SessionId) {
        let Some(handle) = self
            .pollers
            .get(&session_id)
            .map(|h| Arc::clone(h.value()))
        else {
            return;
        };
        handle.cancel();
        handle.join().await;
        self.pollers.remove(&session_id);
        info!("[session {}] 轮询任务已停止", session_id);
    }

    /// 进程停机: 并发停止所有会话并等待, 超出停机期限记错误而不是静默丢弃
    pub async fn stop_all(&self) {
        let live: Vec<(SessionId, Arc<PollerHandle>)> = self
            .pollers
            .iter()
            .map(|e| (*e.key(), Arc::clone(e.value())))
            .collect();
        if live.is_empty() {
            return;
        }
        let mut tasks = JoinSet::new();
        for (session_id, handle) in live {
            let pollers = Arc::clone(&self.pollers);
            tasks.spawn(async move {
                handle.cancel();
                handle.join().await;
                pollers.remove(&session_id);
                info!("[session {}] 轮询任务已停止", session_id);
            });
        }
        let wait_all = async {
            while tasks.join_next().await.is_some() {}
        };
        if time::timeout(self.shutdown_timeout, wait_all).await.is_err() {
            error!(
                "停机超时({}ms), 仍有{}个会话轮询未退出",
                self.shutdown_timeout.as_millis(),
                self.pollers.len()
            );
        }
    }

    pub fn is_running(&self, session_id: SessionId) -> bool {
        self.pollers.contains_key(&session_id)
    }

    pub fn len(&self) -> usize {
        self.pollers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pollers.is_empty()
    }
}

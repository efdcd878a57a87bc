use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::info;

use crate::core::SessionId;

/// 会话轮询任务的状态机. 取消是协作式的:
/// CancelRequested 只在等待点和周期边界被观察到.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PollerState {
    Running = 0,
    CancelRequested = 1,
    Terminated = 2,
}

impl fmt::Display for PollerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PollerState::Running => "Running",
            PollerState::CancelRequested => "CancelRequested",
            PollerState::Terminated => "Terminated",
        };
        f.write_str(s)
    }
}

pub(super) fn load_state(state: &AtomicU8) -> PollerState {
    match state.load(Ordering::Acquire) {
        0 => PollerState::Running,
        1 => PollerState::CancelRequested,
        _ => PollerState::Terminated,
    }
}

pub(super) fn cas_state(state: &AtomicU8, from: PollerState, to: PollerState) -> bool {
    state
        .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
        .is_ok()
}

pub(super) fn store_state(session_id: SessionId, state: &AtomicU8, to: PollerState) {
    let from = load_state(state);
    state.store(to as u8, Ordering::Release);
    info!("[session {}] {} -> {}", session_id, from, to);
}

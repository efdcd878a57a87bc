pub mod reading;
pub mod source;

/// 会话标识, 由外部会话管理方创建和失效, 引擎只作为键持有
pub type SessionId = u64;

//! 合成引擎的进程级状态
//!
//! 引擎在启动时创建一次（后台初始化），初始化失败时服务继续运行，
//! 依赖引擎的操作降级为不可用

use std::sync::{Arc, OnceLock, RwLock};
use tokio::sync::OwnedSemaphorePermit;

use crate::application::error::ApplicationError;
use crate::application::ports::SynthesisEnginePort;
use crate::application::streaming::StreamGate;

/// 引擎状态
pub enum EngineState {
    /// 尚未初始化
    Uninitialized,
    /// 可用
    Ready(Arc<dyn SynthesisEnginePort>),
    /// 初始化失败及原因
    Failed(String),
}

impl EngineState {
    pub fn ready(engine: Arc<dyn SynthesisEnginePort>) -> Self {
        Self::Ready(engine)
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    /// 获取可用引擎，否则返回 EngineUnavailable
    pub fn engine(&self) -> Result<Arc<dyn SynthesisEnginePort>, ApplicationError> {
        match self {
            Self::Ready(engine) => Ok(engine.clone()),
            Self::Uninitialized => Err(ApplicationError::EngineUnavailable(
                "engine was never initialized".to_string(),
            )),
            Self::Failed(reason) => Err(ApplicationError::EngineUnavailable(format!(
                "engine failed to initialize: {}",
                reason
            ))),
        }
    }

    /// 健康检查中展示的状态名
    pub fn label(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Debug for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Ready(_) => write!(f, "Ready(<engine>)"),
            Self::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
        }
    }
}

/// 进程级引擎句柄
///
/// 初始状态为 Uninitialized，启动任务完成后写入一次 Ready 或 Failed
#[derive(Debug)]
pub struct EngineHandle {
    state: RwLock<EngineState>,
}

impl EngineHandle {
    pub fn new(state: EngineState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn uninitialized() -> Self {
        Self::new(EngineState::Uninitialized)
    }

    /// 写入初始化结果
    pub fn install(&self, state: EngineState) {
        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        tracing::info!(from = guard.label(), to = state.label(), "Engine state changed");
        *guard = state;
    }

    pub fn engine(&self) -> Result<Arc<dyn SynthesisEnginePort>, ApplicationError> {
        self.state.read().unwrap_or_else(|e| e.into_inner()).engine()
    }

    pub fn label(&self) -> &'static str {
        self.state.read().unwrap_or_else(|e| e.into_inner()).label()
    }
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self::uninitialized()
    }
}

/// 引擎访问闸门
///
/// 注册（add_speaker）与合成流共用同一个闸门；不可重入的引擎同一时刻只允许一次访问。
/// 策略在首次访问时按引擎声明的可重入性确定
#[derive(Debug)]
pub struct EngineGate {
    max_concurrent_streams: usize,
    gate: OnceLock<StreamGate>,
}

impl EngineGate {
    /// `max_concurrent_streams` 只对可重入引擎生效，0 表示不限
    pub fn new(max_concurrent_streams: usize) -> Self {
        Self {
            max_concurrent_streams,
            gate: OnceLock::new(),
        }
    }

    /// 获取访问许可；不限流时返回 None
    pub async fn acquire(&self, engine: &dyn SynthesisEnginePort) -> Option<OwnedSemaphorePermit> {
        let gate = self.gate.get_or_init(|| {
            let gate = StreamGate::for_engine(engine.is_reentrant(), self.max_concurrent_streams);
            tracing::info!(
                reentrant = engine.is_reentrant(),
                limit = ?gate.limit(),
                "Engine access concurrency policy"
            );
            gate
        });
        gate.acquire().await
    }

    /// 已确定的并发上限；首次访问前为 None
    pub fn limit(&self) -> Option<usize> {
        self.gate.get().and_then(StreamGate::limit)
    }
}

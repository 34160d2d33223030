//! Synthesis Engine Port - 语音合成引擎抽象
//!
//! 文本 + 音色指纹 → 惰性浮点音频帧序列。具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;
use thiserror::Error;

use crate::domain::audio::AudioFrame;
use crate::domain::voice::AudioRef;

/// 合成引擎错误
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Reference audio rejected: {0}")]
    ReferenceRejected(String),

    #[error("Speaker not found: {0}")]
    SpeakerNotFound(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 惰性帧流
///
/// 丢弃该流即释放引擎侧的单流资源
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<AudioFrame, EngineError>> + Send>>;

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 要合成的文本内容
    pub text: String,
    /// 已注册的音色 ID
    pub speaker_id: String,
    /// 该音色的参考音频
    pub reference: AudioRef,
}

/// Synthesis Engine Port
#[async_trait]
pub trait SynthesisEnginePort: Send + Sync {
    /// 登记参考音频，返回最终的 speaker ID
    ///
    /// `speaker_id` 缺失或不被引擎接受时由引擎生成新 ID
    async fn add_speaker(
        &self,
        reference: &AudioRef,
        speaker_id: Option<&str>,
    ) -> Result<String, EngineError>;

    /// 开始合成，返回按产出顺序排列的帧流
    async fn synthesize(&self, request: SynthesisRequest) -> Result<FrameStream, EngineError>;

    /// 引擎能否安全地并发服务多个合成流
    fn is_reentrant(&self) -> bool {
        false
    }

    /// 检查引擎是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}

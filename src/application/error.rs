//! 应用层错误定义
//!
//! 统一的命令错误类型

use thiserror::Error;

use crate::domain::voice::VoiceError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 合成引擎不可用（未初始化或初始化失败）
    #[error("Engine unavailable: {0}")]
    EngineUnavailable(String),

    /// 参考音频被拒绝或违反 ID 策略
    #[error("{0}")]
    InvalidRegistration(String),

    /// 流开始时音色 ID 未注册
    #[error("Unknown voice: {0}")]
    UnknownVoice(String),

    /// 开始流式传输前的其他请求错误
    #[error("{0}")]
    InvalidRequest(String),
}

impl ApplicationError {
    pub fn invalid_registration(message: impl Into<String>) -> Self {
        Self::InvalidRegistration(message.into())
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }
}

impl From<VoiceError> for ApplicationError {
    fn from(err: VoiceError) -> Self {
        match err {
            VoiceError::NotFound(id) => Self::UnknownVoice(id.to_string()),
            other => Self::InvalidRegistration(other.to_string()),
        }
    }
}

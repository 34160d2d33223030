//! Speech Commands

/// 默认模型名（仅回显）
pub const DEFAULT_MODEL: &str = "tts-1";
/// 默认响应格式（仅回显）
pub const DEFAULT_RESPONSE_FORMAT: &str = "pcm";

/// 流式合成命令
#[derive(Debug, Clone)]
pub struct StreamSpeech {
    /// 要合成的文本
    pub input: String,
    /// 已注册的音色 ID
    pub voice: String,
    pub model: String,
    pub response_format: String,
}

impl StreamSpeech {
    pub fn new(input: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            voice: voice.into(),
            model: DEFAULT_MODEL.to_string(),
            response_format: DEFAULT_RESPONSE_FORMAT.to_string(),
        }
    }
}

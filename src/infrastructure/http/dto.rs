//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::{DEFAULT_MODEL, DEFAULT_RESPONSE_FORMAT};

// ============================================================================
// Voice DTOs
// ============================================================================

/// 注册音色参数（query string 或 JSON body）
#[derive(Debug, Deserialize)]
pub struct RegisterVoiceRequest {
    /// 参考音频文件名
    pub audio_file: String,
    /// 期望的 User ID，可选
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterVoiceResponse {
    pub message: String,
    pub user_id: String,
    pub audio_file: String,
}

// ============================================================================
// Speech DTOs
// ============================================================================

/// OpenAI speech API 兼容的请求体
#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    /// 要合成的文本
    pub input: String,
    /// 直接映射为已注册的音色 ID
    pub voice: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_response_format")]
    pub response_format: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_response_format() -> String {
    DEFAULT_RESPONSE_FORMAT.to_string()
}

// ============================================================================
// Health DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub engine: &'static str,
    pub voices: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_request_defaults() {
        let req: SpeechRequest =
            serde_json::from_str(r#"{"input": "hello", "voice": "V1"}"#).unwrap();
        assert_eq!(req.model, "tts-1");
        assert_eq!(req.response_format, "pcm");
    }

    #[test]
    fn test_speech_request_requires_input() {
        let result = serde_json::from_str::<SpeechRequest>(r#"{"voice": "V1"}"#);
        assert!(result.is_err());
    }
}

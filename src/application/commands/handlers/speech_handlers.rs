//! Speech Command Handlers

use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::StreamSpeech;
use crate::application::engine::{EngineGate, EngineHandle};
use crate::application::error::ApplicationError;
use crate::application::ports::{SynthesisRequest, VoiceRegistryPort};
use crate::application::streaming::{encode_stream, SpeechStream};
use crate::domain::voice::{VoiceError, VoiceId};

/// 流式合成选项
#[derive(Debug, Clone)]
pub struct StreamOptions {
    /// 输入文本最大字符数
    pub max_input_chars: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            max_input_chars: 4096,
        }
    }
}

/// StreamSpeech Handler
///
/// 状态: NotStarted → Validating → Streaming → Ended。
/// 这里完成 Validating；返回 Ok 之后所有失败都只表现为流提前结束
pub struct StreamSpeechHandler {
    engine: Arc<EngineHandle>,
    voice_registry: Arc<dyn VoiceRegistryPort>,
    options: StreamOptions,
    /// 与注册共用
    gate: Arc<EngineGate>,
}

impl StreamSpeechHandler {
    pub fn new(
        engine: Arc<EngineHandle>,
        voice_registry: Arc<dyn VoiceRegistryPort>,
        options: StreamOptions,
        gate: Arc<EngineGate>,
    ) -> Self {
        Self {
            engine,
            voice_registry,
            options,
            gate,
        }
    }

    pub async fn handle(&self, command: StreamSpeech) -> Result<SpeechStream, ApplicationError> {
        let engine = self.engine.engine()?;

        self.validate_input(&command.input)?;

        let voice_id = VoiceId::new(command.voice.clone())
            .map_err(|_| ApplicationError::UnknownVoice(command.voice.clone()))?;
        let profile = self.voice_registry.resolve(&voice_id).map_err(|e| match e {
            VoiceError::NotFound(id) => ApplicationError::UnknownVoice(id.to_string()),
            other => ApplicationError::invalid_request(other.to_string()),
        })?;

        // permit 随流存活，流结束前其他引擎访问（包括注册）都要等待
        let permit = self.gate.acquire(engine.as_ref()).await;

        let stream_id = Uuid::new_v4();
        let request = SynthesisRequest {
            text: command.input,
            speaker_id: profile.id().to_string(),
            reference: profile.reference_audio().clone(),
        };

        tracing::info!(
            stream_id = %stream_id,
            voice_id = %profile.id(),
            text_len = request.text.chars().count(),
            model = %command.model,
            response_format = %command.response_format,
            "Speech stream starting"
        );

        // 首字节之前的引擎错误仍可作为请求错误返回
        let frames = engine.synthesize(request).await.map_err(|e| {
            tracing::warn!(stream_id = %stream_id, error = %e, "Engine refused synthesis");
            ApplicationError::invalid_request(e.to_string())
        })?;

        Ok(encode_stream(
            stream_id,
            profile.id().to_string(),
            command.model,
            command.response_format,
            frames,
            permit,
        ))
    }

    fn validate_input(&self, input: &str) -> Result<(), ApplicationError> {
        if input.trim().is_empty() {
            return Err(ApplicationError::invalid_request("Input text cannot be empty"));
        }
        let chars = input.chars().count();
        if chars > self.options.max_input_chars {
            return Err(ApplicationError::invalid_request(format!(
                "Input text too long ({} characters, max {})",
                chars, self.options.max_input_chars
            )));
        }
        Ok(())
    }
}

//! Application State
//!
//! 包含引擎句柄、音色注册表以及各 Command Handler

use std::sync::Arc;

use crate::application::{
    EngineGate, EngineHandle, RegisterVoiceHandler, StreamSpeechHandler, VoiceRegistryPort,
};
use crate::config::AppConfig;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub engine: Arc<EngineHandle>,
    pub voice_registry: Arc<dyn VoiceRegistryPort>,

    // ========== Command Handlers ==========
    pub register_voice_handler: RegisterVoiceHandler,
    pub stream_speech_handler: StreamSpeechHandler,

    /// 引擎中途失败时中断连接，而不是正常结束响应体
    pub abort_on_engine_error: bool,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        engine: Arc<EngineHandle>,
        voice_registry: Arc<dyn VoiceRegistryPort>,
        config: &AppConfig,
    ) -> Self {
        // 注册与合成共用一个引擎访问闸门
        let gate = Arc::new(EngineGate::new(config.engine.max_concurrent_streams));
        let register_voice_handler = RegisterVoiceHandler::new(
            engine.clone(),
            voice_registry.clone(),
            config.registry.duplicate_policy,
            gate.clone(),
        );
        let stream_speech_handler = StreamSpeechHandler::new(
            engine.clone(),
            voice_registry.clone(),
            config.stream_options(),
            gate,
        );

        Self {
            engine,
            voice_registry,
            register_voice_handler,
            stream_speech_handler,
            abort_on_engine_error: config.stream.abort_on_engine_error,
        }
    }
}

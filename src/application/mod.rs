//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（SynthesisEngine、VoiceRegistry）
//! - engine: 引擎进程级状态
//! - streaming: 流式合成流水线
//! - commands: 注册音色、流式合成命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod engine;
pub mod error;
pub mod ports;
pub mod streaming;

// Re-exports
pub use commands::{
    handlers::{
        RegisterVoiceHandler, RegisterVoiceResponse, StreamOptions, StreamSpeechHandler,
    },
    RegisterVoice, StreamSpeech, DEFAULT_MODEL, DEFAULT_RESPONSE_FORMAT,
};

pub use engine::{EngineGate, EngineHandle, EngineState};
pub use error::ApplicationError;

pub use ports::{
    DuplicatePolicy, EngineError, FrameStream, Registered, SynthesisEnginePort, SynthesisRequest,
    VoiceRegistryPort,
};

pub use streaming::{ChunkStream, SpeechStream, StreamGate, StreamOutcome, StreamingFailure};

//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod tts_engine;
mod voice_registry;

pub use tts_engine::{EngineError, FrameStream, SynthesisEnginePort, SynthesisRequest};
pub use voice_registry::{DuplicatePolicy, Registered, VoiceRegistryPort};

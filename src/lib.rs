//! Voxstream - 流式语音合成服务
//!
//! 架构设计: DDD + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Voice: 音色档案与参考音频
//! - Audio: 帧与 PCM 编码
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SynthesisEngine, VoiceRegistry）
//! - Commands: 注册音色、流式合成
//! - Streaming: 帧流 → PCM 块流
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: OpenAI speech API 兼容接口
//! - Memory: 音色注册表内存实现
//! - Adapters: Fake / HTTP 合成引擎

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};

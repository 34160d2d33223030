//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

use crate::application::ports::DuplicatePolicy;
use crate::application::StreamOptions;
use crate::infrastructure::adapters::FakeSynthesisEngineConfig;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 合成引擎配置
    #[serde(default)]
    pub engine: EngineConfig,

    /// 音色注册表配置
    #[serde(default)]
    pub registry: RegistryConfig,

    /// 流式传输配置
    #[serde(default)]
    pub stream: StreamConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 流水线选项
    pub fn stream_options(&self) -> StreamOptions {
        StreamOptions {
            max_input_chars: self.stream.max_input_chars,
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 引擎类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// 本地确定性引擎
    #[default]
    Fake,
    /// 远程 HTTP 引擎
    Http,
}

/// 合成引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub kind: EngineKind,

    /// 远程引擎基础 URL
    #[serde(default = "default_engine_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,

    /// 远程字节流重组时每帧样本数
    #[serde(default = "default_frame_samples")]
    pub frame_samples: usize,

    /// 远程引擎是否可重入
    #[serde(default)]
    pub reentrant: bool,

    /// 可重入引擎的并发流上限，0 表示不限；不可重入引擎恒为 1
    #[serde(default)]
    pub max_concurrent_streams: usize,

    /// Fake 引擎参数
    #[serde(default)]
    pub fake: FakeSynthesisEngineConfig,
}

fn default_engine_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_engine_timeout() -> u64 {
    120
}

fn default_frame_samples() -> usize {
    2400 // 100ms @ 24kHz
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::default(),
            url: default_engine_url(),
            timeout_secs: default_engine_timeout(),
            frame_samples: default_frame_samples(),
            reentrant: false,
            max_concurrent_streams: 0,
            fake: FakeSynthesisEngineConfig::default(),
        }
    }
}

/// 音色注册表配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryConfig {
    /// 显式 ID 重复注册时的策略
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

/// 流式传输配置
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    /// 输入文本最大字符数
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// 引擎中途失败时中断分块传输（而非正常结束）
    #[serde(default)]
    pub abort_on_engine_error: bool,
}

fn default_max_input_chars() -> usize {
    4096
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_input_chars: default_max_input_chars(),
            abort_on_engine_error: false,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

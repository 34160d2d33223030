//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, EngineKind};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 环境变量前缀
const ENV_PREFIX: &str = "VOXSTREAM";

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `VOXSTREAM_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `VOXSTREAM_SERVER__PORT=8080`
/// - `VOXSTREAM_ENGINE__KIND=http`
/// - `VOXSTREAM_ENGINE__URL=http://tts-engine:9000`
/// - `VOXSTREAM_REGISTRY__DUPLICATE_POLICY=overwrite`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("engine.kind", "fake")?
        .set_default("engine.url", "http://localhost:9000")?
        .set_default("engine.timeout_secs", 120)?
        .set_default("engine.frame_samples", 2400)?
        .set_default("engine.reentrant", false)?
        .set_default("engine.max_concurrent_streams", 0)?
        .set_default("registry.duplicate_policy", "reject")?
        .set_default("stream.max_input_chars", 4096)?
        .set_default("stream.abort_on_engine_error", false)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 例如: VOXSTREAM_ENGINE__URL=http://tts-engine:9000
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.engine.kind == EngineKind::Http && config.engine.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Engine URL cannot be empty for the http engine".to_string(),
        ));
    }

    if config.engine.frame_samples == 0 || config.engine.fake.frame_samples == 0 {
        return Err(ConfigError::ValidationError(
            "Frame samples must be greater than 0".to_string(),
        ));
    }

    if config.stream.max_input_chars == 0 {
        return Err(ConfigError::ValidationError(
            "Max input chars must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Engine: {:?}", config.engine.kind);
    if config.engine.kind == EngineKind::Http {
        tracing::info!("Engine URL: {}", config.engine.url);
        tracing::info!("Engine Timeout: {}s", config.engine.timeout_secs);
    }
    tracing::info!("Max Concurrent Streams: {}", config.engine.max_concurrent_streams);
    tracing::info!("Duplicate Voice Policy: {:?}", config.registry.duplicate_policy);
    tracing::info!("Max Input Chars: {}", config.stream.max_input_chars);
    tracing::info!("Abort On Engine Error: {}", config.stream.abort_on_engine_error);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

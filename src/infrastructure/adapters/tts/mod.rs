//! TTS Adapter - 合成引擎实现
//!
//! - Fake: 本地确定性引擎
//! - Http: 远程引擎服务

mod fake_tts_client;
mod http_tts_client;

pub use fake_tts_client::{FakeSynthesisEngine, FakeSynthesisEngineConfig};
pub use http_tts_client::*;

use std::sync::Arc;

use crate::application::engine::EngineState;
use crate::config::{EngineConfig, EngineKind};

/// 按配置初始化合成引擎
///
/// 失败不会中断进程，只记录日志并返回 Failed 状态
pub async fn initialize_engine(config: &EngineConfig) -> EngineState {
    match config.kind {
        EngineKind::Fake => {
            EngineState::ready(Arc::new(FakeSynthesisEngine::new(config.fake.clone())))
        }
        EngineKind::Http => {
            let http_config = HttpSynthesisEngineConfig {
                base_url: config.url.clone(),
                timeout_secs: config.timeout_secs,
                frame_samples: config.frame_samples,
                reentrant: config.reentrant,
            };
            match HttpSynthesisEngine::connect(http_config).await {
                Ok(engine) => EngineState::ready(Arc::new(engine)),
                Err(e) => {
                    tracing::error!(url = %config.url, error = %e, "Failed to initialize synthesis engine");
                    EngineState::failed(e.to_string())
                }
            }
        }
    }
}

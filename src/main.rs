//! Voxstream - 流式语音合成服务

use std::sync::Arc;

use voxstream::application::EngineHandle;
use voxstream::config::{load_config, print_config, AppConfig};
use voxstream::infrastructure::http::{AppState, HttpServer};
use voxstream::infrastructure::{initialize_engine, InMemoryVoiceRegistry};

fn init_tracing(config: &AppConfig) {
    // 优先级：RUST_LOG > 配置文件
    let log_filter = format!(
        "{},voxstream={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// 信号到达时返回；监听本身失败时永不返回
async fn wait_for_shutdown<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("Received shutdown signal"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Voxstream starting");
    print_config(&config);

    // 引擎在后台初始化；完成前请求得到 "引擎不可用"
    let engine = Arc::new(EngineHandle::uninitialized());
    {
        let engine = engine.clone();
        let engine_config = config.engine.clone();
        tokio::spawn(async move {
            let state = initialize_engine(&engine_config).await;
            engine.install(state);
        });
    }

    let voice_registry = Arc::new(InMemoryVoiceRegistry::new());
    let state = AppState::new(engine, voice_registry, &config);

    let server = HttpServer::new(config.server.clone(), state);
    server.run_with_shutdown(shutdown_signal()).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

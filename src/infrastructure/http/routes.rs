//! HTTP Routes
//!
//! API Endpoints:
//! - /set_voice/        GET   注册音色（query: audio_file, user_id）
//! - /set_voice/        POST  注册音色（JSON body）
//! - /v1/audio/speech   POST  流式语音合成（OpenAI speech API 兼容）
//! - /health            GET   健康检查

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(voice_routes())
        .route("/v1/audio/speech", post(handlers::create_speech))
}

/// Voice 路由，带与不带结尾斜杠都可访问
fn voice_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/set_voice/",
            get(handlers::set_voice).post(handlers::set_voice_json),
        )
        .route(
            "/set_voice",
            get(handlers::set_voice).post(handlers::set_voice_json),
        )
}

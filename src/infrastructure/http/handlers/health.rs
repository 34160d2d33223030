//! Health Handler

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::infrastructure::http::dto::HealthResponse;
use crate::infrastructure::http::state::AppState;

/// 健康检查：进程存活即返回 200，引擎状态放在响应体中
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        engine: state.engine.label(),
        voices: state.voice_registry.len(),
    })
}

//! Voice Handlers
//!
//! `/set_voice/` 同时接受 query string (GET) 与 JSON body (POST)

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use std::sync::Arc;

use crate::application::RegisterVoice;
use crate::infrastructure::http::dto::{RegisterVoiceRequest, RegisterVoiceResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

const REGISTERED_MESSAGE: &str = "Speaker voice registered successfully.";

/// 注册音色（query 参数）
pub async fn set_voice(
    State(state): State<Arc<AppState>>,
    params: Result<Query<RegisterVoiceRequest>, QueryRejection>,
) -> Result<Json<RegisterVoiceResponse>, ApiError> {
    let Query(req) = params.map_err(|e| {
        ApiError::BadRequest(format!("Failed to register speaker: {}", e.body_text()))
    })?;
    register(&state, req).await
}

/// 注册音色（JSON body）
pub async fn set_voice_json(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterVoiceRequest>, JsonRejection>,
) -> Result<Json<RegisterVoiceResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| {
        ApiError::BadRequest(format!("Failed to register speaker: {}", e.body_text()))
    })?;
    register(&state, req).await
}

async fn register(
    state: &AppState,
    req: RegisterVoiceRequest,
) -> Result<Json<RegisterVoiceResponse>, ApiError> {
    let command = RegisterVoice {
        audio_file: req.audio_file,
        user_id: req.user_id,
    };

    let result = state
        .register_voice_handler
        .handle(command)
        .await
        .map_err(ApiError::from_registration)?;

    Ok(Json(RegisterVoiceResponse {
        message: REGISTERED_MESSAGE.to_string(),
        user_id: result.user_id,
        audio_file: result.audio_file,
    }))
}

//! HTTP Error Handling
//!
//! 错误体沿用 `{"detail": "..."}`，状态码直接体现错误类别

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
    ServiceUnavailable(String),
}

impl ApiError {
    /// 注册音色的错误映射：引擎不可用 → 503，其余 → 400
    pub fn from_registration(e: ApplicationError) -> Self {
        match e {
            ApplicationError::EngineUnavailable(_) => {
                ApiError::ServiceUnavailable("TTS Engine is not available.".to_string())
            }
            other => ApiError::BadRequest(format!("Failed to register speaker: {}", other)),
        }
    }

    /// 流式合成的错误映射：引擎不可用 → 500，其余首字节前的失败 → 400
    pub fn from_speech(e: ApplicationError) -> Self {
        match e {
            ApplicationError::EngineUnavailable(_) => {
                ApiError::Internal("TTS Engine is not initialized.".to_string())
            }
            other => ApiError::BadRequest(format!("TTS generation failed: {}", other)),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(status = status.as_u16(), error = %msg, "Bad request");
                msg
            }
            ApiError::Internal(msg) => {
                tracing::error!(status = status.as_u16(), error = %msg, "Internal server error");
                msg
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(status = status.as_u16(), error = %msg, "Service unavailable");
                msg
            }
        };

        (status, Json(ErrorResponse::new(detail))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_mapping() {
        let e = ApiError::from_registration(ApplicationError::EngineUnavailable("x".into()));
        assert_eq!(e.status(), StatusCode::SERVICE_UNAVAILABLE);

        let e = ApiError::from_registration(ApplicationError::invalid_registration("bad file"));
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert!(matches!(e, ApiError::BadRequest(msg) if msg == "Failed to register speaker: bad file"));
    }

    #[test]
    fn test_speech_mapping() {
        let e = ApiError::from_speech(ApplicationError::EngineUnavailable("x".into()));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let e = ApiError::from_speech(ApplicationError::UnknownVoice("ghost".into()));
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert!(matches!(e, ApiError::BadRequest(msg) if msg.contains("Unknown voice: ghost")));
    }
}

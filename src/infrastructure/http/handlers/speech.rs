//! Speech Handler
//!
//! OpenAI speech API 兼容的流式合成端点。
//! 响应体为原始 PCM：24kHz、单声道、16-bit little-endian

use async_stream::stream;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::sync::Arc;

use crate::application::{ChunkStream, StreamSpeech};
use crate::domain::audio::PCM_FORMAT;
use crate::infrastructure::http::dto::SpeechRequest;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub const HEADER_MODEL: &str = "x-tts-model";
pub const HEADER_RESPONSE_FORMAT: &str = "x-tts-response-format";
pub const HEADER_SAMPLE_RATE: &str = "x-tts-sample-rate";
pub const HEADER_CHANNELS: &str = "x-tts-channels";
pub const HEADER_BITS_PER_SAMPLE: &str = "x-tts-bits-per-sample";
pub const HEADER_STREAM_ID: &str = "x-tts-stream-id";

/// 流式语音合成
///
/// 首字节前的失败返回错误状态码；之后的引擎失败只表现为响应体提前结束
pub async fn create_speech(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload.map_err(|e| {
        ApiError::BadRequest(format!("TTS generation failed: {}", e.body_text()))
    })?;

    let command = StreamSpeech {
        input: req.input,
        voice: req.voice,
        model: req.model,
        response_format: req.response_format,
    };

    let speech = state
        .stream_speech_handler
        .handle(command)
        .await
        .map_err(ApiError::from_speech)?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
    headers.insert(
        HeaderName::from_static(HEADER_SAMPLE_RATE),
        HeaderValue::from(PCM_FORMAT.sample_rate),
    );
    headers.insert(
        HeaderName::from_static(HEADER_CHANNELS),
        HeaderValue::from(PCM_FORMAT.channels),
    );
    headers.insert(
        HeaderName::from_static(HEADER_BITS_PER_SAMPLE),
        HeaderValue::from(PCM_FORMAT.bits_per_sample),
    );
    // 回显值含非法字符时省略对应头
    for (name, value) in [
        (HEADER_MODEL, speech.model.as_str()),
        (HEADER_RESPONSE_FORMAT, speech.response_format.as_str()),
    ] {
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(HeaderName::from_static(name), value);
        }
    }
    if let Ok(value) = HeaderValue::from_str(&speech.stream_id.to_string()) {
        headers.insert(HeaderName::from_static(HEADER_STREAM_ID), value);
    }

    let body = Body::from_stream(pcm_body(speech.chunks, state.abort_on_engine_error));
    Ok((headers, body).into_response())
}

/// 块流 → 响应体
///
/// 引擎失败时默认正常结束响应体；`abort` 为 true 时向传输层返回错误，连接被中断
fn pcm_body(
    chunks: ChunkStream,
    abort: bool,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    stream! {
        let mut chunks = chunks;
        while let Some(item) = chunks.next().await {
            match item {
                Ok(chunk) => yield Ok(chunk.into_bytes()),
                Err(failure) => {
                    if abort {
                        yield Err(std::io::Error::other(failure));
                    }
                    break;
                }
            }
        }
    }
}

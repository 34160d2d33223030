//! HTTP Synthesis Engine - 调用外部合成引擎 HTTP 服务
//!
//! 实现 SynthesisEnginePort trait
//!
//! 外部引擎 API:
//! GET  {base}/health
//! POST {base}/speakers    Request: {"audio_file": "...", "speaker_id": "..."}  Response: {"speaker_id": "..."}
//! POST {base}/synthesize  Request: {"text": "...", "speaker_id": "...", "audio_file": "..."}
//!                         Response: 分块传输的 f32 小端单声道样本流，采样率见 X-TTS-Sample-Rate

use async_stream::stream;
use async_trait::async_trait;
use bytes::{Buf, BytesMut};
use futures_util::StreamExt;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    EngineError, FrameStream, SynthesisEnginePort, SynthesisRequest,
};
use crate::domain::audio::{AudioFrame, PCM_FORMAT};
use crate::domain::voice::AudioRef;

const BYTES_PER_SAMPLE: usize = 4;

/// 注册 speaker 请求体
#[derive(Debug, Serialize)]
struct AddSpeakerHttpRequest<'a> {
    audio_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    speaker_id: Option<&'a str>,
}

/// 注册 speaker 响应体
#[derive(Debug, Deserialize)]
struct AddSpeakerHttpResponse {
    speaker_id: String,
}

/// 合成请求体
#[derive(Debug, Serialize)]
struct SynthesizeHttpRequest {
    text: String,
    speaker_id: String,
    audio_file: String,
}

/// HTTP 引擎客户端配置
#[derive(Debug, Clone)]
pub struct HttpSynthesisEngineConfig {
    /// 引擎服务基础 URL
    pub base_url: String,
    /// 超时时间（秒）；流式合成只约束建立连接
    pub timeout_secs: u64,
    /// 每帧样本数
    pub frame_samples: usize,
    /// 引擎是否可重入
    pub reentrant: bool,
}

impl Default for HttpSynthesisEngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            timeout_secs: 120,
            frame_samples: 2400,
            reentrant: false,
        }
    }
}

impl HttpSynthesisEngineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 合成引擎
pub struct HttpSynthesisEngine {
    client: Client,
    config: HttpSynthesisEngineConfig,
}

impl HttpSynthesisEngine {
    /// 创建客户端（不做连通性检查）
    pub fn new(config: HttpSynthesisEngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EngineError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 创建客户端并确认引擎可用
    pub async fn connect(config: HttpSynthesisEngineConfig) -> Result<Self, EngineError> {
        let engine = Self::new(config)?;
        if !engine.health_check().await {
            return Err(EngineError::NetworkError(format!(
                "engine health check failed: {}",
                engine.health_url()
            )));
        }
        tracing::info!(base_url = %engine.config.base_url, "HttpSynthesisEngine connected");
        Ok(engine)
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url)
    }

    fn speakers_url(&self) -> String {
        format!("{}/speakers", self.config.base_url)
    }

    fn synthesize_url(&self) -> String {
        format!("{}/synthesize", self.config.base_url)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    fn map_send_error(e: reqwest::Error) -> EngineError {
        if e.is_timeout() {
            EngineError::Timeout
        } else if e.is_connect() {
            EngineError::NetworkError(format!("Cannot connect to engine: {}", e))
        } else {
            EngineError::NetworkError(e.to_string())
        }
    }

    async fn error_body(response: Response) -> String {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        format!("HTTP {}: {}", status, text)
    }
}

#[async_trait]
impl SynthesisEnginePort for HttpSynthesisEngine {
    async fn add_speaker(
        &self,
        reference: &AudioRef,
        speaker_id: Option<&str>,
    ) -> Result<String, EngineError> {
        let body = AddSpeakerHttpRequest {
            audio_file: reference.as_display(),
            speaker_id,
        };

        let response = self
            .client
            .post(self.speakers_url())
            .timeout(self.timeout())
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if status.is_client_error() {
            return Err(EngineError::ReferenceRejected(Self::error_body(response).await));
        }
        if !status.is_success() {
            return Err(EngineError::ServiceError(Self::error_body(response).await));
        }

        let parsed: AddSpeakerHttpResponse = response
            .json()
            .await
            .map_err(|e| EngineError::InvalidResponse(e.to_string()))?;

        tracing::debug!(speaker_id = %parsed.speaker_id, "Engine speaker added");
        Ok(parsed.speaker_id)
    }

    async fn synthesize(&self, request: SynthesisRequest) -> Result<FrameStream, EngineError> {
        let body = SynthesizeHttpRequest {
            text: request.text,
            speaker_id: request.speaker_id.clone(),
            audio_file: request.reference.as_display(),
        };

        tracing::debug!(
            url = %self.synthesize_url(),
            text_len = body.text.len(),
            speaker_id = %body.speaker_id,
            "Sending synthesis request"
        );

        let response = self
            .client
            .post(self.synthesize_url())
            .json(&body)
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(EngineError::SpeakerNotFound(request.speaker_id));
        }
        if !status.is_success() {
            return Err(EngineError::ServiceError(Self::error_body(response).await));
        }

        let sample_rate: Option<u32> = response
            .headers()
            .get("X-TTS-Sample-Rate")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        if let Some(rate) = sample_rate {
            if rate != PCM_FORMAT.sample_rate {
                return Err(EngineError::InvalidResponse(format!(
                    "unsupported sample rate {} (expected {})",
                    rate, PCM_FORMAT.sample_rate
                )));
            }
        }

        let mut assembler = FrameAssembler::new(self.config.frame_samples);
        let mut body = Box::pin(response.bytes_stream());

        // 丢弃该流即关闭与引擎的连接
        let frames = stream! {
            let mut broken = false;
            while let Some(next) = body.next().await {
                match next {
                    Ok(bytes) => {
                        assembler.push(&bytes);
                        while let Some(frame) = assembler.next_frame() {
                            yield Ok(frame);
                        }
                    }
                    Err(e) => {
                        broken = true;
                        yield Err(EngineError::NetworkError(e.to_string()));
                        break;
                    }
                }
            }
            if !broken {
                match assembler.finish() {
                    Ok(Some(frame)) => yield Ok(frame),
                    Ok(None) => {}
                    Err(e) => yield Err(e),
                }
            }
        };

        Ok(Box::pin(frames))
    }

    fn is_reentrant(&self) -> bool {
        self.config.reentrant
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

// ============================================================================
// 字节流 → 帧
// ============================================================================

/// 把任意切分的 f32 小端字节流重组为定长帧
///
/// 网络块边界可能落在样本中间，不完整的样本字节留到下一次 push
#[derive(Debug)]
pub struct FrameAssembler {
    frame_samples: usize,
    buffer: BytesMut,
}

impl FrameAssembler {
    pub fn new(frame_samples: usize) -> Self {
        let frame_samples = frame_samples.max(1);
        Self {
            frame_samples,
            buffer: BytesMut::with_capacity(frame_samples * BYTES_PER_SAMPLE),
        }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// 缓冲区够一整帧时取出
    pub fn next_frame(&mut self) -> Option<AudioFrame> {
        let frame_bytes = self.frame_samples * BYTES_PER_SAMPLE;
        if self.buffer.len() < frame_bytes {
            return None;
        }
        let raw = self.buffer.split_to(frame_bytes);
        Some(Self::decode(&raw))
    }

    /// 流结束：剩余完整样本作为最后一帧；残留半个样本视为引擎错误
    pub fn finish(mut self) -> Result<Option<AudioFrame>, EngineError> {
        let remainder = self.buffer.len() % BYTES_PER_SAMPLE;
        if remainder != 0 {
            return Err(EngineError::InvalidResponse(format!(
                "stream ended with {} trailing bytes of a partial sample",
                remainder
            )));
        }
        if self.buffer.is_empty() {
            return Ok(None);
        }
        let raw = self.buffer.split();
        Ok(Some(Self::decode(&raw)))
    }

    fn decode(raw: &[u8]) -> AudioFrame {
        let mut raw = raw;
        let mut samples = Vec::with_capacity(raw.len() / BYTES_PER_SAMPLE);
        while raw.remaining() >= BYTES_PER_SAMPLE {
            samples.push(raw.get_f32_le());
        }
        AudioFrame::new(samples)
    }
}

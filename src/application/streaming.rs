//! Streaming Synthesis Pipeline
//!
//! 把引擎的惰性帧流转换为传输就绪的 PCM 块流：
//! - 每帧恰好产出一个块，保持产出顺序，不缓存整段语音
//! - 引擎中途出错时以显式终止状态结束流（最后一项为 Err），不再产出任何块
//! - 消费方断开（流被 drop）时立即停止向引擎拉取并释放引擎侧资源
//!
//! 每个流恰好记录一条终止日志：completed / failed / cancelled

use async_stream::stream;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};
use uuid::Uuid;

use crate::application::ports::FrameStream;
use crate::domain::audio::{encode_frame, ConversionError, EncodedChunk};

/// 编码块流；若以 Err 结尾，Err 为最后一项
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<EncodedChunk, StreamingFailure>> + Send>>;

/// 流式传输开始后引擎失败
///
/// 状态行已发出，不再作为错误状态码返回，只体现为提前结束
#[derive(Debug, Clone, Error, PartialEq)]
#[error("stream {stream_id} failed after {chunks} chunks: {cause}")]
pub struct StreamingFailure {
    pub stream_id: Uuid,
    pub chunks: u64,
    pub cause: String,
}

/// 流的终止状态
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    /// 引擎帧序列耗尽
    Completed,
    /// 引擎中途出错
    Failed(String),
    /// 消费方在结束前断开
    Cancelled,
}

/// 一次语音合成的流式响应
pub struct SpeechStream {
    pub stream_id: Uuid,
    /// 原样回显，不做语义解释
    pub model: String,
    /// 原样回显，不做语义解释
    pub response_format: String,
    pub chunks: ChunkStream,
    outcome: watch::Receiver<Option<StreamOutcome>>,
}

impl SpeechStream {
    /// 终止状态订阅；流结束前为 None
    pub fn outcome(&self) -> watch::Receiver<Option<StreamOutcome>> {
        self.outcome.clone()
    }
}

impl std::fmt::Debug for SpeechStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechStream")
            .field("stream_id", &self.stream_id)
            .field("model", &self.model)
            .field("response_format", &self.response_format)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// 并发闸门
// ============================================================================

/// 合成流并发闸门
///
/// 引擎不可重入时同一时刻只允许一个流；可重入时按配置限流，0 表示不限。
/// permit 在流的整个生命周期内持有，完成、失败或取消时释放。
#[derive(Debug, Clone)]
pub struct StreamGate {
    semaphore: Option<Arc<Semaphore>>,
    limit: Option<usize>,
}

impl StreamGate {
    pub fn for_engine(reentrant: bool, max_concurrent_streams: usize) -> Self {
        let limit = match (reentrant, max_concurrent_streams) {
            (false, _) => Some(1),
            (true, 0) => None,
            (true, n) => Some(n),
        };
        Self {
            semaphore: limit.map(|n| Arc::new(Semaphore::new(n))),
            limit,
        }
    }

    /// 同时在途的流上限，None 表示不限
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        match &self.semaphore {
            // semaphore 从不 close，acquire_owned 只会成功
            Some(semaphore) => semaphore.clone().acquire_owned().await.ok(),
            None => None,
        }
    }
}

// ============================================================================
// 终止状态跟踪
// ============================================================================

/// 单个流的计数与终止状态
///
/// 未显式结束就被 drop 视为消费方取消
struct StreamTracker {
    stream_id: Uuid,
    voice_id: String,
    chunks: u64,
    bytes: u64,
    dropped_frames: u64,
    started_at: Instant,
    outcome: watch::Sender<Option<StreamOutcome>>,
    finished: bool,
}

impl StreamTracker {
    fn new(stream_id: Uuid, voice_id: String) -> (Self, watch::Receiver<Option<StreamOutcome>>) {
        let (tx, rx) = watch::channel(None);
        let tracker = Self {
            stream_id,
            voice_id,
            chunks: 0,
            bytes: 0,
            dropped_frames: 0,
            started_at: Instant::now(),
            outcome: tx,
            finished: false,
        };
        (tracker, rx)
    }

    fn record(&mut self, chunk: &EncodedChunk) {
        self.chunks += 1;
        self.bytes += chunk.len() as u64;
    }

    fn drop_frame(&mut self, err: &ConversionError) {
        self.dropped_frames += 1;
        tracing::warn!(
            stream_id = %self.stream_id,
            voice_id = %self.voice_id,
            error = %err,
            "Dropping audio frame that failed PCM conversion"
        );
    }

    fn fail(&mut self, cause: String) -> StreamingFailure {
        let failure = StreamingFailure {
            stream_id: self.stream_id,
            chunks: self.chunks,
            cause: cause.clone(),
        };
        self.finish(StreamOutcome::Failed(cause));
        failure
    }

    fn finish(&mut self, outcome: StreamOutcome) {
        if self.finished {
            return;
        }
        self.finished = true;

        let elapsed_ms = self.started_at.elapsed().as_millis() as u64;
        match &outcome {
            StreamOutcome::Completed => tracing::info!(
                stream_id = %self.stream_id,
                voice_id = %self.voice_id,
                chunks = self.chunks,
                bytes = self.bytes,
                dropped_frames = self.dropped_frames,
                elapsed_ms,
                "Speech stream completed"
            ),
            StreamOutcome::Failed(cause) => tracing::warn!(
                stream_id = %self.stream_id,
                voice_id = %self.voice_id,
                chunks = self.chunks,
                bytes = self.bytes,
                elapsed_ms,
                error = %cause,
                "Speech stream terminated early by engine failure"
            ),
            StreamOutcome::Cancelled => tracing::info!(
                stream_id = %self.stream_id,
                voice_id = %self.voice_id,
                chunks = self.chunks,
                bytes = self.bytes,
                elapsed_ms,
                "Speech stream cancelled by consumer"
            ),
        }

        self.outcome.send_replace(Some(outcome));
    }
}

impl Drop for StreamTracker {
    fn drop(&mut self) {
        self.finish(StreamOutcome::Cancelled);
    }
}

// ============================================================================
// 帧 → 块
// ============================================================================

/// 组装流水线
///
/// `permit` 随流一起存活；引擎帧流先于 permit 释放
pub(crate) fn encode_stream(
    stream_id: Uuid,
    voice_id: String,
    model: String,
    response_format: String,
    frames: FrameStream,
    permit: Option<OwnedSemaphorePermit>,
) -> SpeechStream {
    let (mut tracker, outcome) = StreamTracker::new(stream_id, voice_id);

    let chunks = stream! {
        let _permit = permit;
        let mut frames = frames;
        let mut failure = None;

        while let Some(next) = frames.next().await {
            match next {
                Ok(frame) => match encode_frame(&frame) {
                    Ok(chunk) => {
                        tracker.record(&chunk);
                        yield Ok(chunk);
                    }
                    Err(e) => tracker.drop_frame(&e),
                },
                Err(e) => {
                    failure = Some(tracker.fail(e.to_string()));
                    break;
                }
            }
        }
        drop(frames);

        match failure {
            Some(failure) => yield Err(failure),
            None => tracker.finish(StreamOutcome::Completed),
        }
    };

    SpeechStream {
        stream_id,
        model,
        response_format,
        chunks: Box::pin(chunks),
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::EngineError;
    use crate::domain::audio::AudioFrame;
    use futures_util::stream;

    fn frames(items: Vec<Result<AudioFrame, EngineError>>) -> FrameStream {
        Box::pin(stream::iter(items))
    }

    fn build(items: Vec<Result<AudioFrame, EngineError>>) -> SpeechStream {
        encode_stream(
            Uuid::new_v4(),
            "V1".to_string(),
            "tts-1".to_string(),
            "pcm".to_string(),
            frames(items),
            None,
        )
    }

    #[tokio::test]
    async fn test_one_chunk_per_frame_in_order() {
        let speech = build(vec![
            Ok(AudioFrame::new(vec![1.0, 0.0])),
            Ok(AudioFrame::new(vec![-1.0])),
            Ok(AudioFrame::new(vec![0.5, 0.5, 0.5])),
        ]);
        let outcome = speech.outcome();

        let chunks: Vec<_> = speech.chunks.collect().await;
        let lens: Vec<usize> = chunks.iter().map(|c| c.as_ref().unwrap().len()).collect();
        assert_eq!(lens, vec![4, 2, 6]);
        assert_eq!(chunks[1].as_ref().unwrap().as_bytes(), &(-32767i16).to_le_bytes());
        assert_eq!(*outcome.borrow(), Some(StreamOutcome::Completed));
    }

    #[tokio::test]
    async fn test_engine_error_terminates_with_failure() {
        let speech = build(vec![
            Ok(AudioFrame::new(vec![0.1; 4])),
            Err(EngineError::ServiceError("gpu fault".to_string())),
            Ok(AudioFrame::new(vec![0.1; 4])),
        ]);
        let stream_id = speech.stream_id;
        let outcome = speech.outcome();

        let items: Vec<_> = speech.chunks.collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        let failure = items[1].as_ref().unwrap_err();
        assert_eq!(failure.stream_id, stream_id);
        assert_eq!(failure.chunks, 1);
        assert!(failure.cause.contains("gpu fault"));

        match &*outcome.borrow() {
            Some(StreamOutcome::Failed(cause)) => assert!(cause.contains("gpu fault")),
            other => panic!("unexpected outcome: {:?}", other),
        };
    }

    #[tokio::test]
    async fn test_non_finite_frame_is_skipped() {
        let speech = build(vec![
            Ok(AudioFrame::new(vec![0.1, 0.2])),
            Ok(AudioFrame::new(vec![0.1, f32::NAN])),
            Ok(AudioFrame::new(vec![0.3])),
        ]);

        let chunks: Vec<_> = speech.chunks.collect().await;
        let lens: Vec<usize> = chunks.iter().map(|c| c.as_ref().unwrap().len()).collect();
        assert_eq!(lens, vec![4, 2]);
    }

    #[tokio::test]
    async fn test_drop_before_end_is_cancelled() {
        let mut speech = build(vec![
            Ok(AudioFrame::new(vec![0.1])),
            Ok(AudioFrame::new(vec![0.2])),
        ]);
        let outcome = speech.outcome();

        let first = speech.chunks.next().await;
        assert!(matches!(first, Some(Ok(_))));
        drop(speech);

        assert_eq!(*outcome.borrow(), Some(StreamOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_empty_engine_output_completes() {
        let speech = build(vec![]);
        let outcome = speech.outcome();
        let chunks: Vec<_> = speech.chunks.collect().await;
        assert!(chunks.is_empty());
        assert_eq!(*outcome.borrow(), Some(StreamOutcome::Completed));
    }

    #[test]
    fn test_gate_policy() {
        assert_eq!(StreamGate::for_engine(false, 0).limit(), Some(1));
        assert_eq!(StreamGate::for_engine(false, 8).limit(), Some(1));
        assert_eq!(StreamGate::for_engine(true, 0).limit(), None);
        assert_eq!(StreamGate::for_engine(true, 3).limit(), Some(3));
    }

    #[tokio::test]
    async fn test_gate_permit_released_with_stream() {
        let gate = StreamGate::for_engine(false, 0);
        let permit = gate.acquire().await;
        assert!(permit.is_some());

        let speech = encode_stream(
            Uuid::new_v4(),
            "V1".to_string(),
            "tts-1".to_string(),
            "pcm".to_string(),
            frames(vec![Ok(AudioFrame::new(vec![0.0]))]),
            permit,
        );

        // 流存活期间闸门已满
        let waiting = tokio::time::timeout(std::time::Duration::from_millis(20), gate.acquire()).await;
        assert!(waiting.is_err());

        drop(speech);
        let again = tokio::time::timeout(std::time::Duration::from_millis(200), gate.acquire()).await;
        assert!(matches!(again, Ok(Some(_))));
    }
}

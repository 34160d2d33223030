//! Fake Synthesis Engine - 本地确定性合成引擎
//!
//! 不加载任何模型，按文本长度产出正弦波帧；用于开发与测试

use async_stream::stream;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    EngineError, FrameStream, SynthesisEnginePort, SynthesisRequest,
};
use crate::domain::audio::{AudioFrame, PCM_FORMAT};
use crate::domain::voice::{AudioRef, VoiceId};

/// Fake 引擎配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FakeSynthesisEngineConfig {
    /// 每帧样本数
    pub frame_samples: usize,
    /// 每帧对应的文本字符数
    pub chars_per_frame: usize,
    /// 帧间隔（毫秒），模拟实时生成
    pub frame_interval_ms: u64,
    /// 是否声明为可重入
    pub reentrant: bool,
    /// 注册时要求参考音频文件存在
    pub require_existing_reference: bool,
    /// 产出 N 帧后模拟引擎故障
    pub fail_after_frames: Option<usize>,
}

impl Default for FakeSynthesisEngineConfig {
    fn default() -> Self {
        Self {
            frame_samples: 480, // 20ms @ 24kHz
            chars_per_frame: 8,
            frame_interval_ms: 0,
            reentrant: false,
            require_existing_reference: false,
            fail_after_frames: None,
        }
    }
}

/// 流计数，随帧流一起 drop
struct StreamSlot {
    active: Arc<AtomicUsize>,
}

impl Drop for StreamSlot {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Fake Synthesis Engine
pub struct FakeSynthesisEngine {
    config: FakeSynthesisEngineConfig,
    speakers: DashMap<String, AudioRef>,
    next_id: AtomicU64,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    produced: Arc<AtomicU64>,
}

impl FakeSynthesisEngine {
    pub fn new(config: FakeSynthesisEngineConfig) -> Self {
        tracing::info!(
            frame_samples = config.frame_samples,
            frame_interval_ms = config.frame_interval_ms,
            reentrant = config.reentrant,
            "FakeSynthesisEngine initialized"
        );
        Self {
            config,
            speakers: DashMap::new(),
            next_id: AtomicU64::new(1),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            produced: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeSynthesisEngineConfig::default())
    }

    /// 当前在途的合成流数量
    pub fn active_streams(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// 历史最大并发合成流数量
    pub fn peak_streams(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// 累计产出帧数
    pub fn frames_produced(&self) -> u64 {
        self.produced.load(Ordering::SeqCst)
    }

    fn open_slot(&self) -> StreamSlot {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        StreamSlot {
            active: self.active.clone(),
        }
    }

    /// 生成未被占用的 ID：V1, V2, ...
    fn generate_id(&self) -> String {
        loop {
            let id = format!("V{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            if !self.speakers.contains_key(&id) {
                return id;
            }
        }
    }

    /// 由 speaker ID 派生的基频，使不同音色的输出可区分
    fn pitch_hz(speaker_id: &str) -> f32 {
        let seed = speaker_id
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        110.0 + (seed % 220) as f32
    }
}

#[async_trait]
impl SynthesisEnginePort for FakeSynthesisEngine {
    async fn add_speaker(
        &self,
        reference: &AudioRef,
        speaker_id: Option<&str>,
    ) -> Result<String, EngineError> {
        if self.config.require_existing_reference
            && !tokio::fs::try_exists(reference.path()).await.unwrap_or(false)
        {
            return Err(EngineError::ReferenceRejected(format!(
                "reference audio not found: {}",
                reference.as_display()
            )));
        }

        let id = match speaker_id {
            Some(id) if VoiceId::is_well_formed(id) => id.to_string(),
            _ => self.generate_id(),
        };
        self.speakers.insert(id.clone(), reference.clone());

        tracing::debug!(
            speaker_id = %id,
            reference = %reference.as_display(),
            "FakeSynthesisEngine: speaker added"
        );
        Ok(id)
    }

    async fn synthesize(&self, request: SynthesisRequest) -> Result<FrameStream, EngineError> {
        if !self.speakers.contains_key(&request.speaker_id) {
            return Err(EngineError::SpeakerNotFound(request.speaker_id));
        }

        let chars = request.text.chars().count();
        let per_frame = self.config.chars_per_frame.max(1);
        let total_frames = chars.div_ceil(per_frame).max(1);
        let frame_samples = self.config.frame_samples;
        let interval = Duration::from_millis(self.config.frame_interval_ms);
        let fail_after = self.config.fail_after_frames;
        let pitch = Self::pitch_hz(&request.speaker_id);
        let produced = self.produced.clone();
        let slot = self.open_slot();

        tracing::debug!(
            speaker_id = %request.speaker_id,
            frames = total_frames,
            "FakeSynthesisEngine: synthesis started"
        );

        let frames = stream! {
            let _slot = slot;
            let step = std::f32::consts::TAU * pitch / PCM_FORMAT.sample_rate as f32;
            let mut phase = 0.0f32;

            for index in 0..total_frames {
                if fail_after == Some(index) {
                    yield Err(EngineError::ServiceError(format!(
                        "simulated failure after {} frames",
                        index
                    )));
                    break;
                }
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }

                let samples: Vec<f32> = (0..frame_samples)
                    .map(|_| {
                        let s = 0.5 * phase.sin();
                        phase = (phase + step) % std::f32::consts::TAU;
                        s
                    })
                    .collect();
                produced.fetch_add(1, Ordering::SeqCst);
                yield Ok(AudioFrame::new(samples));
            }
        };

        Ok(Box::pin(frames))
    }

    fn is_reentrant(&self) -> bool {
        self.config.reentrant
    }
}

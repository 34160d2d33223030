//! Audio Context - 帧与编码块

use bytes::Bytes;

/// 引擎每个生产步骤输出的一帧音频
///
/// 单声道、固定采样率，样本理论上位于 [-1.0, 1.0]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioFrame {
    samples: Vec<f32>,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<f32>> for AudioFrame {
    fn from(samples: Vec<f32>) -> Self {
        Self::new(samples)
    }
}

/// 一帧音频的传输形式
///
/// 不变量: 字节长度 = 2 × 样本数，恒为偶数
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedChunk {
    bytes: Bytes,
}

impl EncodedChunk {
    pub(super) fn from_pcm(bytes: Vec<u8>) -> Self {
        debug_assert!(bytes.len() % 2 == 0);
        Self {
            bytes: Bytes::from(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.bytes.len() / 2
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

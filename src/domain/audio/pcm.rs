//! PCM 转换
//!
//! `round(s * 32767)` 后饱和到 i16 范围，小端编码。
//! -1.0 映射为 -32767 而不是 -32768，与既有客户端保持逐位兼容。

use thiserror::Error;

use super::{AudioFrame, EncodedChunk};

/// 传输层隐式约定的音频格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

/// 24000 Hz / 单声道 / s16le
pub const PCM_FORMAT: PcmFormat = PcmFormat {
    sample_rate: 24_000,
    channels: 1,
    bits_per_sample: 16,
};

const SCALE: f64 = i16::MAX as f64;

/// 帧转换错误，整帧丢弃
#[derive(Debug, Error, PartialEq)]
pub enum ConversionError {
    #[error("non-finite sample {value} at index {index}")]
    NonFiniteSample { index: usize, value: f32 },
}

/// 单个样本转换
///
/// 超出 [-1.0, 1.0] 的样本饱和而非回绕
pub fn sample_to_i16(sample: f32) -> i16 {
    let scaled = (sample as f64 * SCALE).round();
    scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// 将一帧编码为传输块
///
/// 只要有一个样本非有限值，整帧返回错误，不输出部分帧
pub fn encode_frame(frame: &AudioFrame) -> Result<EncodedChunk, ConversionError> {
    let samples = frame.samples();
    if let Some((index, &value)) = samples.iter().enumerate().find(|(_, s)| !s.is_finite()) {
        return Err(ConversionError::NonFiniteSample { index, value });
    }

    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        out.extend_from_slice(&sample_to_i16(s).to_le_bytes());
    }
    Ok(EncodedChunk::from_pcm(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(chunk: &EncodedChunk) -> Vec<i16> {
        chunk
            .as_bytes()
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()
    }

    #[test]
    fn test_boundary_samples() {
        assert_eq!(sample_to_i16(1.0), 32767);
        assert_eq!(sample_to_i16(-1.0), -32767);
        assert_eq!(sample_to_i16(0.0), 0);
    }

    #[test]
    fn test_rounding() {
        // 0.5 * 32767 = 16383.5，四舍五入远离零
        assert_eq!(sample_to_i16(0.5), 16384);
        assert_eq!(sample_to_i16(-0.5), -16384);
        assert_eq!(sample_to_i16(1.0 / 32767.0), 1);
    }

    #[test]
    fn test_out_of_range_saturates() {
        assert_eq!(sample_to_i16(1.5), i16::MAX);
        assert_eq!(sample_to_i16(-1.5), i16::MIN);
        assert_eq!(sample_to_i16(1000.0), i16::MAX);
    }

    #[test]
    fn test_encode_frame_little_endian() {
        let frame = AudioFrame::new(vec![1.0, -1.0, 0.0]);
        let chunk = encode_frame(&frame).unwrap();

        assert_eq!(chunk.as_bytes(), &[0xff, 0x7f, 0x01, 0x80, 0x00, 0x00]);
        assert_eq!(decode(&chunk), vec![32767, -32767, 0]);
        assert_eq!(chunk.sample_count(), 3);
    }

    #[test]
    fn test_chunk_length_is_even() {
        for n in [0usize, 1, 7, 2400] {
            let frame = AudioFrame::new(vec![0.25; n]);
            let chunk = encode_frame(&frame).unwrap();
            assert_eq!(chunk.len(), n * 2);
            assert_eq!(chunk.len() % 2, 0);
        }
    }

    #[test]
    fn test_non_finite_drops_whole_frame() {
        let frame = AudioFrame::new(vec![0.1, f32::NAN, 0.2]);
        let err = encode_frame(&frame).unwrap_err();
        assert!(matches!(err, ConversionError::NonFiniteSample { index: 1, .. }));

        let frame = AudioFrame::new(vec![f32::INFINITY]);
        assert!(encode_frame(&frame).is_err());
    }

    #[test]
    fn test_pcm_format_contract() {
        assert_eq!(PCM_FORMAT.sample_rate, 24_000);
        assert_eq!(PCM_FORMAT.channels, 1);
        assert_eq!(PCM_FORMAT.bits_per_sample, 16);
    }
}

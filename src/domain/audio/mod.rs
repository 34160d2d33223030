//! Audio Context - 音频帧与 PCM 线格式
//!
//! 合成引擎输出归一化浮点帧，传输层只看到 16-bit 小端 PCM 字节

mod frame;
mod pcm;

pub use frame::{AudioFrame, EncodedChunk};
pub use pcm::{encode_frame, sample_to_i16, ConversionError, PcmFormat, PCM_FORMAT};

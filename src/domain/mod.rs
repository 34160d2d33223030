//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Voice Context: 音色档案
//! - Audio Context: 音频帧与 PCM 编码

pub mod audio;
pub mod voice;

//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 音色 ID 与参考音频的关联
//! - 参考音频描述符

mod aggregate;
mod errors;
mod value_objects;

pub use aggregate::VoiceProfile;
pub use errors::VoiceError;
pub use value_objects::{AudioFormat, AudioRef, VoiceId, MAX_VOICE_ID_LEN};

//! Voice Context - Errors

use thiserror::Error;

use super::VoiceId;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Unknown voice: {0}")]
    NotFound(VoiceId),

    #[error("Voice already registered: {0}")]
    AlreadyExists(VoiceId),

    #[error("Invalid voice id: {0}")]
    InvalidId(String),

    #[error("Invalid reference audio: {0}")]
    InvalidReferenceAudio(String),
}

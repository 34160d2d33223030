//! Voice Context - Aggregate Root

use chrono::{DateTime, Utc};

use super::{AudioRef, VoiceId};

/// 音色档案聚合根
///
/// 不变量:
/// - 每个 VoiceProfile 有且只有一个 reference audio
/// - 注册后在进程生命周期内有效，不提供删除
#[derive(Debug, Clone)]
pub struct VoiceProfile {
    id: VoiceId,
    reference_audio: AudioRef,
    registered_at: DateTime<Utc>,
}

impl VoiceProfile {
    pub fn new(id: VoiceId, reference_audio: AudioRef) -> Self {
        Self {
            id,
            reference_audio,
            registered_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &VoiceId {
        &self.id
    }

    pub fn reference_audio(&self) -> &AudioRef {
        &self.reference_audio
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }
}

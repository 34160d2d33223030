//! In-Memory Voice Registry Implementation

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::application::ports::{DuplicatePolicy, Registered, VoiceRegistryPort};
use crate::domain::voice::{VoiceError, VoiceId, VoiceProfile};

/// 内存音色注册表
///
/// 按分片加锁，插入通过 entry API 完成，查询不会看到写了一半的条目
pub struct InMemoryVoiceRegistry {
    profiles: DashMap<VoiceId, VoiceProfile>,
}

impl InMemoryVoiceRegistry {
    pub fn new() -> Self {
        Self {
            profiles: DashMap::new(),
        }
    }
}

impl Default for InMemoryVoiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceRegistryPort for InMemoryVoiceRegistry {
    fn register(
        &self,
        profile: VoiceProfile,
        explicit: bool,
        policy: DuplicatePolicy,
    ) -> Result<Registered, VoiceError> {
        match self.profiles.entry(profile.id().clone()) {
            Entry::Vacant(entry) => {
                entry.insert(profile.clone());
                Ok(Registered {
                    profile,
                    replaced: None,
                })
            }
            Entry::Occupied(mut entry) => {
                if !explicit || policy == DuplicatePolicy::Reject {
                    return Err(VoiceError::AlreadyExists(profile.id().clone()));
                }
                let previous = entry.insert(profile.clone());
                tracing::debug!(
                    voice_id = %profile.id(),
                    previous = %previous.reference_audio().as_display(),
                    "Voice profile overwritten"
                );
                Ok(Registered {
                    profile,
                    replaced: Some(previous),
                })
            }
        }
    }

    fn resolve(&self, id: &VoiceId) -> Result<VoiceProfile, VoiceError> {
        self.profiles
            .get(id)
            .map(|p| p.clone())
            .ok_or_else(|| VoiceError::NotFound(id.clone()))
    }

    fn contains(&self, id: &VoiceId) -> bool {
        self.profiles.contains_key(id)
    }

    fn len(&self) -> usize {
        self.profiles.len()
    }
}

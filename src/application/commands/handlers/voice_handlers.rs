//! Voice Command Handlers

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::commands::RegisterVoice;
use crate::application::engine::{EngineGate, EngineHandle};
use crate::application::error::ApplicationError;
use crate::application::ports::{DuplicatePolicy, VoiceRegistryPort};
use crate::domain::voice::{AudioRef, VoiceError, VoiceId, VoiceProfile};

// ============================================================================
// RegisterVoice
// ============================================================================

/// 注册音色响应
#[derive(Debug, Clone)]
pub struct RegisterVoiceResponse {
    pub user_id: String,
    pub audio_file: String,
    /// 是否替换了已有档案
    pub replaced: bool,
}

/// RegisterVoice Handler
///
/// 注册串行执行（单写者），保证引擎 speaker 表与注册表不会出现分歧；
/// 查询走并发 map，不受注册锁影响。
/// add_speaker 经过与合成流共用的引擎闸门
pub struct RegisterVoiceHandler {
    engine: Arc<EngineHandle>,
    voice_registry: Arc<dyn VoiceRegistryPort>,
    duplicate_policy: DuplicatePolicy,
    gate: Arc<EngineGate>,
    registration_lock: Mutex<()>,
}

impl RegisterVoiceHandler {
    pub fn new(
        engine: Arc<EngineHandle>,
        voice_registry: Arc<dyn VoiceRegistryPort>,
        duplicate_policy: DuplicatePolicy,
        gate: Arc<EngineGate>,
    ) -> Self {
        Self {
            engine,
            voice_registry,
            duplicate_policy,
            gate,
            registration_lock: Mutex::new(()),
        }
    }

    pub async fn handle(
        &self,
        command: RegisterVoice,
    ) -> Result<RegisterVoiceResponse, ApplicationError> {
        let engine = self.engine.engine()?;

        let reference = AudioRef::parse(&command.audio_file)
            .map_err(|e| VoiceError::InvalidReferenceAudio(e.to_string()))?;

        let requested = command
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let _guard = self.registration_lock.lock().await;

        // 显式 ID 已存在且策略为拒绝时，不触碰引擎
        if let (Some(id), DuplicatePolicy::Reject) = (&requested, self.duplicate_policy) {
            if let Ok(id) = VoiceId::new(id.clone()) {
                if self.voice_registry.contains(&id) {
                    return Err(VoiceError::AlreadyExists(id).into());
                }
            }
        }

        let permit = self.gate.acquire(engine.as_ref()).await;
        let assigned = engine
            .add_speaker(&reference, requested.as_deref())
            .await
            .map_err(|e| ApplicationError::invalid_registration(e.to_string()))?;
        drop(permit);

        let voice_id = VoiceId::new(assigned.clone())
            .map_err(|_| VoiceError::InvalidId(assigned.clone()))?;
        let explicit = requested.as_deref() == Some(voice_id.as_str());

        if requested.is_some() && !explicit {
            tracing::debug!(
                requested = ?requested,
                assigned = %voice_id,
                "Engine replaced requested voice id"
            );
        }

        let registered = self.voice_registry.register(
            VoiceProfile::new(voice_id, reference),
            explicit,
            self.duplicate_policy,
        )?;

        let profile = registered.profile;
        tracing::info!(
            voice_id = %profile.id(),
            audio_file = %profile.reference_audio().as_display(),
            replaced = registered.replaced.is_some(),
            registered_at = %profile.registered_at(),
            "Voice registered"
        );

        Ok(RegisterVoiceResponse {
            user_id: profile.id().to_string(),
            audio_file: command.audio_file,
            replaced: registered.replaced.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::handlers::{StreamOptions, StreamSpeechHandler};
    use crate::application::commands::StreamSpeech;
    use crate::application::engine::EngineState;
    use crate::infrastructure::adapters::{FakeSynthesisEngine, FakeSynthesisEngineConfig};
    use crate::infrastructure::memory::InMemoryVoiceRegistry;
    use futures_util::StreamExt;
    use std::collections::HashSet;
    use std::time::Duration;

    fn setup(policy: DuplicatePolicy) -> (Arc<RegisterVoiceHandler>, Arc<InMemoryVoiceRegistry>) {
        let engine = Arc::new(EngineHandle::new(EngineState::ready(Arc::new(
            FakeSynthesisEngine::with_defaults(),
        ))));
        let registry = Arc::new(InMemoryVoiceRegistry::new());
        let handler = Arc::new(RegisterVoiceHandler::new(
            engine,
            registry.clone(),
            policy,
            Arc::new(EngineGate::new(0)),
        ));
        (handler, registry)
    }

    fn command(audio_file: &str, user_id: Option<&str>) -> RegisterVoice {
        RegisterVoice {
            audio_file: audio_file.to_string(),
            user_id: user_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_register_generates_id() {
        let (handler, registry) = setup(DuplicatePolicy::Reject);

        let result = handler.handle(command("sample.wav", None)).await.unwrap();
        assert_eq!(result.user_id, "V1");
        assert_eq!(result.audio_file, "sample.wav");

        let profile = registry.resolve(&VoiceId::new("V1").unwrap()).unwrap();
        assert_eq!(profile.reference_audio().as_display(), "sample.wav");
    }

    #[tokio::test]
    async fn test_register_uses_requested_id() {
        let (handler, _) = setup(DuplicatePolicy::Reject);
        let result = handler
            .handle(command("alice.wav", Some("alice")))
            .await
            .unwrap();
        assert_eq!(result.user_id, "alice");
    }

    #[tokio::test]
    async fn test_malformed_requested_id_gets_generated_one() {
        let (handler, _) = setup(DuplicatePolicy::Reject);
        let result = handler
            .handle(command("alice.wav", Some("not valid!")))
            .await
            .unwrap();
        assert_eq!(result.user_id, "V1");

        // 空白 ID 视为未提供
        let result = handler.handle(command("bob.wav", Some("  "))).await.unwrap();
        assert_eq!(result.user_id, "V2");
    }

    #[tokio::test]
    async fn test_invalid_reference_rejected() {
        let (handler, registry) = setup(DuplicatePolicy::Reject);

        let err = handler.handle(command("notes.txt", None)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidRegistration(_)));

        let err = handler.handle(command("", None)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidRegistration(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_explicit_id_rejected() {
        let (handler, registry) = setup(DuplicatePolicy::Reject);
        handler.handle(command("a.wav", Some("alice"))).await.unwrap();

        let err = handler
            .handle(command("b.wav", Some("alice")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidRegistration(_)));

        let profile = registry.resolve(&VoiceId::new("alice").unwrap()).unwrap();
        assert_eq!(profile.reference_audio().as_display(), "a.wav");
    }

    #[tokio::test]
    async fn test_duplicate_explicit_id_overwritten() {
        let (handler, registry) = setup(DuplicatePolicy::Overwrite);
        handler.handle(command("a.wav", Some("alice"))).await.unwrap();

        let result = handler.handle(command("b.wav", Some("alice"))).await.unwrap();
        assert!(result.replaced);
        assert_eq!(registry.len(), 1);

        let profile = registry.resolve(&VoiceId::new("alice").unwrap()).unwrap();
        assert_eq!(profile.reference_audio().as_display(), "b.wav");
    }

    #[tokio::test]
    async fn test_engine_unavailable() {
        let registry = Arc::new(InMemoryVoiceRegistry::new());
        let handler = RegisterVoiceHandler::new(
            Arc::new(EngineHandle::uninitialized()),
            registry.clone(),
            DuplicatePolicy::Reject,
            Arc::new(EngineGate::new(0)),
        );

        let err = handler.handle(command("sample.wav", None)).await.unwrap_err();
        assert!(matches!(err, ApplicationError::EngineUnavailable(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_registrations_never_collide() {
        let (handler, registry) = setup(DuplicatePolicy::Reject);

        let mut tasks = Vec::new();
        for i in 0..16 {
            let generating = handler.clone();
            tasks.push(tokio::spawn(async move {
                generating
                    .handle(command(&format!("gen{}.wav", i), None))
                    .await
                    .unwrap()
                    .user_id
            }));
            let naming = handler.clone();
            tasks.push(tokio::spawn(async move {
                naming
                    .handle(command(&format!("named{}.wav", i), Some(&format!("user-{}", i))))
                    .await
                    .unwrap()
                    .user_id
            }));
        }

        let mut ids = HashSet::new();
        for task in tasks {
            assert!(ids.insert(task.await.unwrap()));
        }
        assert_eq!(ids.len(), 32);
        assert_eq!(registry.len(), 32);

        for i in 0..16 {
            let id = VoiceId::new(format!("user-{}", i)).unwrap();
            let profile = registry.resolve(&id).unwrap();
            assert_eq!(profile.reference_audio().as_display(), format!("named{}.wav", i));
        }
    }

    #[tokio::test]
    async fn test_registration_waits_for_open_stream_on_non_reentrant_engine() {
        let fake = Arc::new(FakeSynthesisEngine::new(FakeSynthesisEngineConfig {
            chars_per_frame: 1,
            frame_interval_ms: 5,
            ..Default::default()
        }));
        let engine = Arc::new(EngineHandle::new(EngineState::ready(fake.clone())));
        let registry = Arc::new(InMemoryVoiceRegistry::new());
        let gate = Arc::new(EngineGate::new(0));
        let register = Arc::new(RegisterVoiceHandler::new(
            engine.clone(),
            registry.clone(),
            DuplicatePolicy::Reject,
            gate.clone(),
        ));
        let speech = StreamSpeechHandler::new(engine, registry.clone(), StreamOptions::default(), gate);

        register.handle(command("a.wav", Some("alice"))).await.unwrap();

        let mut stream = speech
            .handle(StreamSpeech::new("a".repeat(50), "alice"))
            .await
            .unwrap();
        assert!(stream.chunks.next().await.is_some());

        let pending = {
            let register = register.clone();
            tokio::spawn(async move { register.handle(command("b.wav", Some("bob"))).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!pending.is_finished());
        assert_eq!(registry.len(), 1);
        assert_eq!(fake.active_streams(), 1);

        // 流消费完毕释放 permit 后注册才进入引擎
        while stream.chunks.next().await.is_some() {}
        drop(stream);

        let result = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(result.user_id, "bob");
        assert_eq!(registry.len(), 2);
    }
}

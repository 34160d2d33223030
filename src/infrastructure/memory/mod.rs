//! Memory Layer - In-Memory State Management
//!
//! 音色注册表的内存实现，生命周期与进程一致

mod voice_registry;

pub use voice_registry::InMemoryVoiceRegistry;

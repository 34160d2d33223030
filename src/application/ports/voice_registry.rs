//! Voice Registry Port - 音色 ID → 参考音频映射
//!
//! 进程内唯一的共享可变状态

use serde::Deserialize;

use crate::domain::voice::{VoiceError, VoiceId, VoiceProfile};

/// 显式指定的 ID 已被注册时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// 拒绝注册
    #[default]
    Reject,
    /// 替换已有参考音频
    Overwrite,
}

/// 注册结果
#[derive(Debug, Clone)]
pub struct Registered {
    pub profile: VoiceProfile,
    /// 被替换掉的旧档案（仅 Overwrite 策略）
    pub replaced: Option<VoiceProfile>,
}

/// Voice Registry Port
///
/// 实现必须保证插入与查询的原子性：并发查询看不到写了一半的条目
pub trait VoiceRegistryPort: Send + Sync {
    /// 插入音色档案
    ///
    /// `explicit` 为 true 表示该 ID 是调用方指定的，适用 `policy`；
    /// 引擎生成的 ID 与已有条目冲突时总是失败
    fn register(
        &self,
        profile: VoiceProfile,
        explicit: bool,
        policy: DuplicatePolicy,
    ) -> Result<Registered, VoiceError>;

    /// 查询音色档案
    fn resolve(&self, id: &VoiceId) -> Result<VoiceProfile, VoiceError>;

    fn contains(&self, id: &VoiceId) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! Voice Commands

/// 注册音色命令
#[derive(Debug, Clone)]
pub struct RegisterVoice {
    /// 参考音频引用（文件名/路径）
    pub audio_file: String,
    /// 调用方期望的 ID，可选
    pub user_id: Option<String>,
}

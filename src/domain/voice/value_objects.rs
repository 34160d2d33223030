//! Voice Context - Value Objects

use std::path::{Path, PathBuf};

/// 请求方可指定的音色 ID 最大长度
pub const MAX_VOICE_ID_LEN: usize = 64;

/// 音色唯一标识
///
/// 不透明字符串，由调用方提供或由合成引擎生成
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceId(String);

impl VoiceId {
    pub fn new(id: impl Into<String>) -> Result<Self, &'static str> {
        let id = id.into();
        if id.is_empty() {
            return Err("voice id cannot be empty");
        }
        Ok(Self(id))
    }

    /// 是否满足调用方自定义 ID 的格式要求
    ///
    /// 1-64 个字符，仅允许 `[A-Za-z0-9_-]`
    pub fn is_well_formed(id: &str) -> bool {
        !id.is_empty()
            && id.len() <= MAX_VOICE_ID_LEN
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 音频格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,
}

impl AudioFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "flac" => Some(Self::Flac),
            "ogg" => Some(Self::Ogg),
            _ => None,
        }
    }
}

/// 音频引用 - 参考音频的描述符
///
/// 不变量:
/// - path 非空
/// - format 由扩展名推断
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioRef {
    path: PathBuf,
    format: AudioFormat,
}

impl AudioRef {
    /// 从调用方给出的引用字符串解析
    pub fn parse(reference: &str) -> Result<Self, &'static str> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err("reference audio cannot be empty");
        }
        Self::from_path(PathBuf::from(reference))
    }

    /// 从路径自动推断格式
    pub fn from_path(path: PathBuf) -> Result<Self, &'static str> {
        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(AudioFormat::from_extension)
            .ok_or("unrecognized audio format (expected wav, mp3, flac or ogg)")?;

        Ok(Self { path, format })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// 原样返回给调用方的引用字符串
    pub fn as_display(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_id_rejects_empty() {
        assert!(VoiceId::new("").is_err());
        assert_eq!(VoiceId::new("V1").unwrap().as_str(), "V1");
    }

    #[test]
    fn test_voice_id_well_formed() {
        assert!(VoiceId::is_well_formed("alice_01"));
        assert!(VoiceId::is_well_formed("a-b"));
        assert!(!VoiceId::is_well_formed(""));
        assert!(!VoiceId::is_well_formed("has space"));
        assert!(!VoiceId::is_well_formed("../etc"));
        assert!(!VoiceId::is_well_formed(&"x".repeat(MAX_VOICE_ID_LEN + 1)));
    }

    #[test]
    fn test_audio_ref_infers_format() {
        let audio = AudioRef::parse("sample.WAV").unwrap();
        assert_eq!(audio.format(), AudioFormat::Wav);
        assert_eq!(audio.as_display(), "sample.WAV");

        assert!(AudioRef::parse("  ").is_err());
        assert!(AudioRef::parse("notes.txt").is_err());
        assert!(AudioRef::parse("noext").is_err());
    }
}

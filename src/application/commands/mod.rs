//! 应用层 - 命令
//!
//! 注册音色、流式合成两个用例

mod speech_commands;
mod voice_commands;

pub mod handlers;

pub use speech_commands::*;
pub use voice_commands::*;

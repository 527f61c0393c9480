//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：翻译作业

mod translate_commands;

pub mod handlers;

pub use translate_commands::*;

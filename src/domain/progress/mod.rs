//! Progress Context - 翻译进度上下文
//!
//! 职责:
//! - 作业级进度聚合（章节计数、当前章节、时间戳）
//! - 章节级进度实体（块游标、已翻译块、错误计数）
//! - 作业/章节状态机

mod aggregate;
mod entities;
mod errors;
mod value_objects;

pub use aggregate::TranslationProgress;
pub use entities::ChapterProgress;
pub use errors::ProgressError;
pub use value_objects::{
    timestamp_to_datetime, unix_now, ChapterState, ChapterSummary, JobState, ProgressSummary,
};

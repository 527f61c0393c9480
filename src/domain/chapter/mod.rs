//! Chapter Context - 章节上下文
//!
//! 职责:
//! - 文档模型提供的章节源（标记文本）
//! - 翻译完成的章节记录（缓存与渲染的唯一输入）
//! - 章节标题提取

mod entities;
mod title;

pub use entities::{sort_records, upsert_record, ChapterRecord, ChapterSource};
pub use title::{extract_title, MAX_TITLE_CHARS};

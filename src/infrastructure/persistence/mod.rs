//! Persistence Layer - 数据持久化
//!
//! 进度文件与章节缓存的 JSON 文件实现

pub mod json_file;

pub use json_file::{chapter_cache_path, JsonChapterStore, JsonProgressStore};

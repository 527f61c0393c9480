//! Memory Layer - In-Memory Adapters
//!
//! 进度存储、章节缓存与文档的内存实现，供测试与预览使用

mod chapter_store;
mod document;
mod progress_store;

pub use chapter_store::InMemoryChapterStore;
pub use document::InMemoryDocument;
pub use progress_store::InMemoryProgressStore;

//! Application Services - 翻译流水线核心服务
//!
//! - ProgressTracker: 进度状态机与持久化
//! - ChapterCache: 已完成章节缓存
//! - ChunkTranslator: 单块翻译与重试策略
//! - ChapterProcessor: 单章编排（可按块恢复）

mod chapter_cache;
mod chapter_processor;
mod chunk_translator;
mod progress_tracker;

pub use chapter_cache::ChapterCache;
pub use chapter_processor::{ChapterProcessor, CHUNK_SEPARATOR};
pub use chunk_translator::{
    ChunkTranslator, PromptTemplate, RetryClass, RetryPolicy, DEFAULT_PROMPT_TEMPLATE,
};
pub use progress_tracker::ProgressTracker;

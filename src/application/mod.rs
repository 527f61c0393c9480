//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Completion、Document、Renderer、Storage）
//! - services: 翻译流水线服务（进度跟踪、章节缓存、块翻译、章节处理）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod services;

// Re-exports
pub use commands::{
    handlers::TranslateBookHandler, ChapterFailurePolicy, TranslateBook, TranslateBookResponse,
};

pub use error::{ApplicationError, TranslationError};

pub use ports::{
    // Completion
    CompletionError,
    CompletionPort,
    // Document
    DocumentError,
    DocumentPort,
    TextExtractorPort,
    // Renderer
    OutputFormat,
    RenderError,
    RenderRequest,
    RendererPort,
    // Storage
    ChapterStorePort,
    ProgressStorePort,
    StoreError,
};

pub use queries::{
    handlers::{ChapterOverview, ShowChaptersHandler, ShowChaptersResponse},
    ShowChapters,
};

pub use services::{
    ChapterCache, ChapterProcessor, ChunkTranslator, PromptTemplate, ProgressTracker, RetryPolicy,
};

//! EPUB Translator - 基于 LLM 的逐章电子书翻译工具
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Chunker: 按句子边界切分文本，带重叠
//! - Progress: 章节与块级进度状态
//! - Chapter: 章节来源、译文记录与标题提取
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Completion, Document, Renderer, Storage）
//! - Services: ProgressTracker, ChapterCache, ChunkTranslator, ChapterProcessor
//! - Commands: TranslateBook
//! - Queries: ShowChapters
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: LLM 客户端（OpenAI/Azure/Gemini/Ollama）、EPUB 读取、Markdown/EPUB 渲染
//! - Persistence: 进度文件与章节缓存（JSON）
//! - Memory: 内存实现（测试用）
//! - Events: 进度事件广播

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};

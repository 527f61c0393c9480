//! Domain Layer - 领域层
//!
//! 包含三个部分:
//! - Chunker: 文本分块（纯函数，无状态）
//! - Progress Context: 作业/章节进度状态机
//! - Chapter Context: 章节源与章节记录

pub mod chapter;
pub mod chunker;
pub mod progress;

pub use chapter::{extract_title, ChapterRecord, ChapterSource};
pub use chunker::{ChunkConfig, ChunkMetadata, ChunkWarning, Chunker};
pub use progress::{ChapterProgress, ChapterState, JobState, ProgressError, TranslationProgress};

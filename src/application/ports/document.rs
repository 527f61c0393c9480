//! Document Ports - 文档模型端口
//!
//! 文档模型按展示顺序提供章节，文本提取器把标记转换为纯文本

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ChapterSource;

/// 文档错误
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Failed to open document: {0}")]
    Open(String),

    #[error("Failed to read chapter {chapter}: {message}")]
    Read { chapter: usize, message: String },
}

/// 文档端口
#[async_trait]
pub trait DocumentPort: Send + Sync {
    /// 按展示顺序返回全部章节（第 1 章在前）
    async fn chapters(&self) -> Result<Vec<ChapterSource>, DocumentError>;

    /// 书名（若可知）
    fn title(&self) -> Option<String>;
}

/// 文本提取端口
pub trait TextExtractorPort: Send + Sync {
    /// 标记转纯文本，段落之间以空行分隔
    fn extract_text(&self, markup: &str) -> String;
}

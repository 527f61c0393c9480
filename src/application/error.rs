//! 应用层错误定义
//!
//! 翻译错误与命令/查询错误类型

use thiserror::Error;

use super::ports::{DocumentError, RenderError};
use crate::domain::ProgressError;

/// 翻译错误
///
/// 瞬时错误（网络、限流）在重试循环内被吸收，调用方只会看到成功或此错误
#[derive(Debug, Error)]
pub enum TranslationError {
    /// 重试次数耗尽
    #[error("Failed to translate chunk after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// 章节内某块翻译失败
    #[error("Chapter {chapter}, chunk {chunk} failed: {source}")]
    Chunk {
        chapter: usize,
        chunk: usize,
        #[source]
        source: Box<TranslationError>,
    },

    /// 进度状态错误
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

impl TranslationError {
    /// 尝试次数（若适用）
    pub fn attempts(&self) -> Option<u32> {
        match self {
            TranslationError::RetriesExhausted { attempts, .. } => Some(*attempts),
            TranslationError::Chunk { source, .. } => source.attempts(),
            TranslationError::Progress(_) => None,
        }
    }
}

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 文档读取错误（作业开始前致命）
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// 翻译错误
    #[error("Translation failed: {0}")]
    Translation(#[from] TranslationError),

    /// 作业在某章中断，进度已保存
    #[error("Translation interrupted at chapter {chapter}: {source}")]
    Interrupted {
        chapter: usize,
        #[source]
        source: TranslationError,
    },

    /// 进度错误
    #[error("Progress error: {0}")]
    Progress(#[from] ProgressError),

    /// 渲染错误
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// 章节范围无效
    #[error("Invalid chapter range: {0}")]
    InvalidRange(String),
}

impl ApplicationError {
    /// 中断时可用于恢复的起始章节
    pub fn resume_chapter(&self) -> Option<usize> {
        match self {
            ApplicationError::Interrupted { chapter, .. } => Some(*chapter),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_error_reports_attempts() {
        let err = TranslationError::Chunk {
            chapter: 2,
            chunk: 4,
            source: Box::new(TranslationError::RetriesExhausted {
                attempts: 3,
                last_error: "Request timeout".into(),
            }),
        };
        assert_eq!(err.attempts(), Some(3));
        assert_eq!(
            err.to_string(),
            "Chapter 2, chunk 4 failed: Failed to translate chunk after 3 attempts: Request timeout"
        );
    }

    #[test]
    fn test_resume_chapter_only_for_interrupts() {
        let err = ApplicationError::Interrupted {
            chapter: 7,
            source: TranslationError::RetriesExhausted {
                attempts: 1,
                last_error: "x".into(),
            },
        };
        assert_eq!(err.resume_chapter(), Some(7));
        assert_eq!(ApplicationError::InvalidRange("x".into()).resume_chapter(), None);
    }
}

//! Storage Ports - 持久化端口
//!
//! 进度文件与章节缓存是仅有的两个持久化状态

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ChapterRecord, TranslationProgress};

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// 进度存储端口
#[async_trait]
pub trait ProgressStorePort: Send + Sync {
    /// 读取持久化进度，不存在时返回 None
    async fn load(&self) -> Result<Option<TranslationProgress>, StoreError>;

    /// 整体覆盖写入
    async fn save(&self, progress: &TranslationProgress) -> Result<(), StoreError>;

    /// 删除持久化进度
    async fn clear(&self) -> Result<(), StoreError>;

    /// 存储位置描述（日志用）
    fn location(&self) -> String;
}

/// 章节缓存存储端口
#[async_trait]
pub trait ChapterStorePort: Send + Sync {
    /// 读取全部记录，不存在时返回空
    async fn load(&self) -> Result<Vec<ChapterRecord>, StoreError>;

    /// 整体覆盖写入
    async fn save(&self, records: &[ChapterRecord]) -> Result<(), StoreError>;

    /// 存储位置描述（日志用）
    fn location(&self) -> String;
}

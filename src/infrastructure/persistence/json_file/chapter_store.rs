//! JSON Chapter Store

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{read_if_exists, write_json_atomic};
use crate::application::ports::{ChapterStorePort, StoreError};
use crate::domain::ChapterRecord;

/// 章节缓存文件存储
pub struct JsonChapterStore {
    path: PathBuf,
}

impl JsonChapterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ChapterStorePort for JsonChapterStore {
    async fn load(&self) -> Result<Vec<ChapterRecord>, StoreError> {
        match read_if_exists(&self.path).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, records: &[ChapterRecord]) -> Result<(), StoreError> {
        write_json_atomic(&self.path, records).await
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip_preserves_order_and_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonChapterStore::new(dir.path().join("progress.chapters.json"));
        assert!(store.load().await.unwrap().is_empty());

        let records = vec![
            ChapterRecord::new(1, "Początek", "Zażółć gęślą jaźń."),
            ChapterRecord::new(2, "Chapter 2", ""),
        ];
        store.save(&records).await.unwrap();

        assert_eq!(store.load().await.unwrap(), records);

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"number\": 1"));
        assert!(raw.contains("\"title\": \"Początek\""));
    }
}

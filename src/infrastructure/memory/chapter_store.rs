//! In-Memory Chapter Store Implementation

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::ports::{ChapterStorePort, StoreError};
use crate::domain::ChapterRecord;

/// 内存章节缓存
#[derive(Default)]
pub struct InMemoryChapterStore {
    records: Mutex<Vec<ChapterRecord>>,
}

impl InMemoryChapterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ChapterRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub async fn snapshot(&self) -> Vec<ChapterRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl ChapterStorePort for InMemoryChapterStore {
    async fn load(&self) -> Result<Vec<ChapterRecord>, StoreError> {
        Ok(self.records.lock().await.clone())
    }

    async fn save(&self, records: &[ChapterRecord]) -> Result<(), StoreError> {
        *self.records.lock().await = records.to_vec();
        Ok(())
    }

    fn location(&self) -> String {
        "memory://chapters".to_string()
    }
}

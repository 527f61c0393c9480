//! Chapter Cache - 已完成章节缓存
//!
//! 每完成一章整体覆盖写入；读取失败退化为空缓存

use std::sync::Arc;

use crate::application::ports::ChapterStorePort;
use crate::domain::chapter::sort_records;
use crate::domain::ChapterRecord;

/// 章节缓存
pub struct ChapterCache {
    store: Arc<dyn ChapterStorePort>,
}

impl ChapterCache {
    pub fn new(store: Arc<dyn ChapterStorePort>) -> Self {
        Self { store }
    }

    /// 覆盖保存全部记录，失败只记录警告
    pub async fn save(&self, records: &[ChapterRecord]) {
        match self.store.save(records).await {
            Ok(()) => tracing::debug!(
                location = %self.store.location(),
                chapters = records.len(),
                "Chapter cache saved"
            ),
            Err(e) => tracing::warn!(
                location = %self.store.location(),
                error = %e,
                "Could not save chapter cache"
            ),
        }
    }

    /// 读取记录并按编号排序；缺失或损坏时返回空
    pub async fn load(&self) -> Vec<ChapterRecord> {
        match self.store.load().await {
            Ok(mut records) => {
                sort_records(&mut records);
                if !records.is_empty() {
                    tracing::info!(
                        location = %self.store.location(),
                        chapters = records.len(),
                        "Loaded completed chapters from cache"
                    );
                }
                records
            }
            Err(e) => {
                tracing::warn!(
                    location = %self.store.location(),
                    error = %e,
                    "Could not load chapter cache"
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::StoreError;
    use crate::infrastructure::memory::InMemoryChapterStore;
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl ChapterStorePort for BrokenStore {
        async fn load(&self) -> Result<Vec<ChapterRecord>, StoreError> {
            Err(StoreError::Serialization("expected value at line 1".into()))
        }

        async fn save(&self, _records: &[ChapterRecord]) -> Result<(), StoreError> {
            Err(StoreError::Io("read-only".into()))
        }

        fn location(&self) -> String {
            "broken".into()
        }
    }

    #[tokio::test]
    async fn test_load_sorts_by_number() {
        let store = InMemoryChapterStore::with_records(vec![
            ChapterRecord::new(3, "c", "3"),
            ChapterRecord::new(1, "a", "1"),
        ])
        .arc();
        let cache = ChapterCache::new(store);

        let numbers: Vec<usize> = cache.load().await.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_save_overwrites_snapshot() {
        let store = InMemoryChapterStore::new().arc();
        let cache = ChapterCache::new(store.clone());

        cache.save(&[ChapterRecord::new(1, "a", "x")]).await;
        cache.save(&[ChapterRecord::new(2, "b", "y")]).await;

        let saved = store.snapshot().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].number, 2);
    }

    #[tokio::test]
    async fn test_failures_degrade_gracefully() {
        let cache = ChapterCache::new(Arc::new(BrokenStore));
        assert!(cache.load().await.is_empty());
        cache.save(&[ChapterRecord::new(1, "a", "x")]).await;
    }
}

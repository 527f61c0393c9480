//! In-Memory Progress Store Implementation

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::ports::{ProgressStorePort, StoreError};
use crate::domain::TranslationProgress;

/// 内存进度存储
///
/// 可注入写入失败，并统计保存次数
#[derive(Default)]
pub struct InMemoryProgressStore {
    state: Mutex<Option<TranslationProgress>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
    corrupt: AtomicBool,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以已有进度初始化（模拟上次运行留下的文件）
    pub fn with_progress(progress: TranslationProgress) -> Self {
        Self {
            state: Mutex::new(Some(progress)),
            ..Self::default()
        }
    }

    /// 模拟损坏的进度文件
    pub fn corrupted() -> Self {
        let store = Self::default();
        store.corrupt.store(true, Ordering::SeqCst);
        store
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Option<TranslationProgress> {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl ProgressStorePort for InMemoryProgressStore {
    async fn load(&self) -> Result<Option<TranslationProgress>, StoreError> {
        if self.corrupt.load(Ordering::SeqCst) {
            return Err(StoreError::Serialization("corrupt progress record".to_string()));
        }
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, progress: &TranslationProgress) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io("simulated write failure".to_string()));
        }
        *self.state.lock().await = Some(progress.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.state.lock().await = None;
        self.corrupt.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory://progress".to_string()
    }
}

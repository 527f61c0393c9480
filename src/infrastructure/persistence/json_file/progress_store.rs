//! JSON Progress Store

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{read_if_exists, write_json_atomic};
use crate::application::ports::{ProgressStorePort, StoreError};
use crate::domain::TranslationProgress;

/// 进度文件存储
pub struct JsonProgressStore {
    path: PathBuf,
}

impl JsonProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ProgressStorePort for JsonProgressStore {
    async fn load(&self) -> Result<Option<TranslationProgress>, StoreError> {
        let Some(bytes) = read_if_exists(&self.path).await? else {
            return Ok(None);
        };
        let progress: TranslationProgress = serde_json::from_slice(&bytes)?;
        tracing::debug!(path = %self.path.display(), "Progress loaded");
        Ok(Some(progress))
    }

    async fn save(&self, progress: &TranslationProgress) -> Result<(), StoreError> {
        write_json_atomic(&self.path, progress).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

//! EPUB Document - 基于 `epub` crate 的文档适配器
//!
//! 按 spine 顺序读取全部条目，章节编号从 1 开始

use async_trait::async_trait;
use epub::doc::EpubDoc;
use std::path::{Path, PathBuf};

use crate::application::ports::{DocumentError, DocumentPort};
use crate::domain::ChapterSource;

/// EPUB 文档
pub struct EpubDocument {
    path: PathBuf,
}

impl EpubDocument {
    /// 打开前仅检查文件存在，解析延迟到读取章节时
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let path = path.into();
        if !path.is_file() {
            return Err(DocumentError::NotFound(path.display().to_string()));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// 同步读取 spine 中的全部条目
fn read_spine(path: &Path) -> Result<Vec<ChapterSource>, DocumentError> {
    let mut doc = EpubDoc::new(path)
        .map_err(|e| DocumentError::Open(format!("{}: {}", path.display(), e)))?;

    let mut chapters = Vec::new();
    loop {
        let number = chapters.len() + 1;
        let id = doc
            .get_current_id()
            .unwrap_or_else(|| format!("item{}", number));

        match doc.get_current_str() {
            Some((markup, _mime)) => {
                tracing::debug!(chapter = number, id = %id, chars = markup.len(), "Read spine item");
                chapters.push(ChapterSource::new(id, markup));
            }
            None => {
                return Err(DocumentError::Read {
                    chapter: number,
                    message: format!("spine item '{}' has no readable content", id),
                });
            }
        }

        if !doc.go_next() {
            break;
        }
    }

    Ok(chapters)
}

#[async_trait]
impl DocumentPort for EpubDocument {
    async fn chapters(&self) -> Result<Vec<ChapterSource>, DocumentError> {
        let path = self.path.clone();
        let chapters = tokio::task::spawn_blocking(move || read_spine(&path))
            .await
            .map_err(|e| DocumentError::Open(format!("EPUB reader task failed: {}", e)))??;

        tracing::info!(
            path = %self.path.display(),
            chapters = chapters.len(),
            "EPUB loaded"
        );
        Ok(chapters)
    }

    fn title(&self) -> Option<String> {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    }
}

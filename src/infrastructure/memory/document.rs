//! In-Memory Document Implementation

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::ports::{DocumentError, DocumentPort};
use crate::domain::ChapterSource;

/// 内存文档
pub struct InMemoryDocument {
    title: Option<String>,
    chapters: Vec<ChapterSource>,
}

impl InMemoryDocument {
    pub fn new(chapters: Vec<ChapterSource>) -> Self {
        Self {
            title: None,
            chapters,
        }
    }

    /// 由 HTML 片段构造，id 依次为 chapter1、chapter2 …
    pub fn from_markup<I, S>(markups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chapters = markups
            .into_iter()
            .enumerate()
            .map(|(i, markup)| ChapterSource::new(format!("chapter{}", i + 1), markup))
            .collect();
        Self::new(chapters)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl DocumentPort for InMemoryDocument {
    async fn chapters(&self) -> Result<Vec<ChapterSource>, DocumentError> {
        Ok(self.chapters.clone())
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }
}

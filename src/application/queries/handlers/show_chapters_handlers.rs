//! Show Chapters Query Handler

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{DocumentPort, TextExtractorPort};
use crate::application::queries::ShowChapters;
use crate::domain::{extract_title, Chunker};

/// 预览默认长度（字符）
pub const PREVIEW_LENGTH: usize = 250;

// ============================================================================
// Response DTOs
// ============================================================================

/// 单章概览
#[derive(Debug, Clone)]
pub struct ChapterOverview {
    pub number: usize,
    pub id: String,
    pub title: String,
    /// 原始标记字符数
    pub markup_chars: usize,
    /// 提取文本字符数
    pub text_chars: usize,
    pub word_count: usize,
    pub estimated_chunks: usize,
    /// 以下字段仅在 detailed 时填充
    pub preview: Option<String>,
    pub chunk_count: Option<usize>,
    pub warnings: Vec<String>,
}

/// 章节概览响应
#[derive(Debug, Clone)]
pub struct ShowChaptersResponse {
    pub book_title: Option<String>,
    pub model: String,
    pub from_lang: String,
    pub to_lang: Option<String>,
    pub chapters: Vec<ChapterOverview>,
}

impl ShowChaptersResponse {
    pub fn total_chapters(&self) -> usize {
        self.chapters.len()
    }

    pub fn total_characters(&self) -> usize {
        self.chapters.iter().map(|c| c.markup_chars).sum()
    }

    pub fn total_words(&self) -> usize {
        self.chapters.iter().map(|c| c.word_count).sum()
    }

    pub fn total_estimated_chunks(&self) -> usize {
        self.chapters.iter().map(|c| c.estimated_chunks).sum()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// ShowChapters Handler
pub struct ShowChaptersHandler {
    document: Arc<dyn DocumentPort>,
    extractor: Arc<dyn TextExtractorPort>,
    chunker: Chunker,
}

impl ShowChaptersHandler {
    pub fn new(
        document: Arc<dyn DocumentPort>,
        extractor: Arc<dyn TextExtractorPort>,
        chunker: Chunker,
    ) -> Self {
        Self {
            document,
            extractor,
            chunker,
        }
    }

    pub async fn handle(
        &self,
        query: ShowChapters,
    ) -> Result<ShowChaptersResponse, ApplicationError> {
        let sources = self.document.chapters().await?;

        let chapters = sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                let number = i + 1;
                let text = self.extractor.extract_text(&source.markup);

                let mut overview = ChapterOverview {
                    number,
                    id: source.id.clone(),
                    title: extract_title(&source.markup, number),
                    markup_chars: source.markup.chars().count(),
                    text_chars: text.chars().count(),
                    word_count: text.split_whitespace().count(),
                    estimated_chunks: self.chunker.estimate_chunks(&text),
                    preview: None,
                    chunk_count: None,
                    warnings: Vec::new(),
                };

                if query.detailed {
                    let chunks = self.chunker.split(&text);
                    overview.preview = Some(preview(&text, PREVIEW_LENGTH));
                    overview.chunk_count = Some(chunks.len());
                    overview.warnings = self
                        .chunker
                        .validate(&chunks)
                        .iter()
                        .map(ToString::to_string)
                        .collect();
                }

                overview
            })
            .collect::<Vec<_>>();

        tracing::debug!(chapters = chapters.len(), "Chapter overview built");

        Ok(ShowChaptersResponse {
            book_title: self.document.title(),
            model: query.model,
            from_lang: query.from_lang,
            to_lang: query.to_lang,
            chapters,
        })
    }
}

/// 截取预览：句末超过 70% 处截断，否则词边界超过 80% 处截断加省略号，否则硬截断
pub fn preview(text: &str, max_length: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_length {
        return text.to_string();
    }

    let truncated: String = text.chars().take(max_length).collect();
    let char_pos = |byte: usize| truncated[..byte].chars().count();

    let last_sentence = truncated
        .rfind(['.', '!', '?'])
        .map(|byte| (byte, char_pos(byte)));
    let last_space = truncated.rfind(' ').map(|byte| (byte, char_pos(byte)));

    if let Some((byte, pos)) = last_sentence {
        if pos as f64 > max_length as f64 * 0.7 {
            return truncated[..=byte].to_string();
        }
    }
    if let Some((byte, pos)) = last_space {
        if pos as f64 > max_length as f64 * 0.8 {
            return format!("{}...", &truncated[..byte]);
        }
    }
    format!("{}...", truncated)
}

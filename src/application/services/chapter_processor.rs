//! Chapter Processor - 章节处理
//!
//! 文本提取 → 分块 → 逐块翻译 → 组装章节记录，按块粒度可恢复：
//! - 从 start_chunk_index 开始翻译，之前的块使用进度中保存的译文
//! - 每块成功后译文与游标一起落盘
//! - 某块重试耗尽时记录错误并中止本章，已完成的块保留给下次恢复

use std::sync::Arc;

use super::{ChunkTranslator, ProgressTracker};
use crate::application::error::TranslationError;
use crate::application::ports::TextExtractorPort;
use crate::domain::{extract_title, ChapterRecord, ChapterSource, Chunker};

/// 章节内块之间的分隔符
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// 章节处理器
pub struct ChapterProcessor {
    chunker: Chunker,
    translator: ChunkTranslator,
    extractor: Arc<dyn TextExtractorPort>,
    tracker: Arc<ProgressTracker>,
}

impl ChapterProcessor {
    pub fn new(
        chunker: Chunker,
        translator: ChunkTranslator,
        extractor: Arc<dyn TextExtractorPort>,
        tracker: Arc<ProgressTracker>,
    ) -> Self {
        Self {
            chunker,
            translator,
            extractor,
            tracker,
        }
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    /// 翻译一个章节
    ///
    /// 调用方传入 `start_chunk_index = tracker.get_chapter_progress(n)` 以恢复
    pub async fn process(
        &self,
        source: &ChapterSource,
        from_lang: &str,
        to_lang: &str,
        chapter_number: usize,
        start_chunk_index: usize,
    ) -> Result<ChapterRecord, TranslationError> {
        let title = extract_title(&source.markup, chapter_number);
        let text = self.extractor.extract_text(&source.markup);

        if text.trim().is_empty() {
            tracing::info!(chapter = chapter_number, id = %source.id, "Chapter has no text content");
            self.tracker.start_chapter(chapter_number, 0).await?;
            self.tracker.complete_chapter(chapter_number).await?;
            return Ok(ChapterRecord::new(chapter_number, title, String::new()));
        }

        let chunks = self.chunker.split(&text);
        let total_chunks = chunks.len();
        for warning in self.chunker.validate(&chunks) {
            tracing::debug!(chapter = chapter_number, warning = %warning, "Chunk validation");
        }
        tracing::info!(chapter = chapter_number, total_chunks, "Chapter split into chunks");

        self.register_chapter(chapter_number, total_chunks).await?;

        let mut translated = self.tracker.chunk_results(chapter_number).await;
        let start = start_chunk_index.min(translated.len()).min(total_chunks);
        if start_chunk_index > translated.len() {
            tracing::warn!(
                chapter = chapter_number,
                requested = start_chunk_index,
                available = translated.len(),
                "Resume cursor ahead of stored chunk results, resuming from last stored chunk"
            );
        }
        translated.truncate(start);
        if start > 0 {
            tracing::info!(chapter = chapter_number, from_chunk = start + 1, total_chunks, "Resuming chapter");
        }

        for (index, chunk) in chunks.iter().enumerate().skip(start) {
            tracing::info!(
                chapter = chapter_number,
                chunk = index + 1,
                total_chunks,
                chars = chunk.chars().count(),
                "Translating chunk"
            );

            match self.translator.translate(chunk, from_lang, to_lang).await {
                Ok(result) => {
                    self.tracker
                        .commit_chunk(chapter_number, index, result.clone(), total_chunks)
                        .await?;
                    translated.push(result);
                }
                Err(e) => {
                    self.tracker.record_error(chapter_number, &e.to_string()).await;
                    return Err(TranslationError::Chunk {
                        chapter: chapter_number,
                        chunk: index + 1,
                        source: Box::new(e),
                    });
                }
            }
        }

        self.tracker.complete_chapter(chapter_number).await?;
        tracing::info!(chapter = chapter_number, title = %title, "Chapter translated");

        Ok(ChapterRecord::new(
            chapter_number,
            title,
            translated.join(CHUNK_SEPARATOR),
        ))
    }

    /// 登记章节；块数与已存记录不一致时重置（旧译文已失效）
    async fn register_chapter(
        &self,
        chapter_number: usize,
        total_chunks: usize,
    ) -> Result<(), TranslationError> {
        if let Some(existing) = self.tracker.chapter(chapter_number).await {
            if existing.total_chunks() != total_chunks && existing.completed_chunks() > 0 {
                tracing::warn!(
                    chapter = chapter_number,
                    previous = existing.total_chunks(),
                    current = total_chunks,
                    "Chunk count changed since last run, restarting chapter"
                );
                self.tracker.reset_chapter(chapter_number, total_chunks).await?;
                return Ok(());
            }
        }
        self.tracker.start_chapter(chapter_number, total_chunks).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::{PromptTemplate, RetryPolicy};
    use crate::application::ports::CompletionError;
    use crate::domain::ChunkConfig;
    use crate::infrastructure::adapters::document::HtmlTextExtractor;
    use crate::infrastructure::adapters::llm::{prompt_text, ScriptedCompletionClient};
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::memory::InMemoryProgressStore;

    /// 10 个 100 字符的句子，按下面的配置切成 5 块（每块 2 句）
    fn five_chunk_chapter() -> ChapterSource {
        let body = (0..10)
            .map(|i| format!("{:04} {}.", i, "w".repeat(94)))
            .collect::<Vec<_>>()
            .join(" ");
        ChapterSource::new("ch", format!(
            "<html><head><title>Opening</title></head><body><p>{}</p></body></html>",
            body
        ))
    }

    fn chunker() -> Chunker {
        Chunker::new(ChunkConfig {
            max_chunk_size: 250,
            overlap_size: 0,
            min_chunk_size: 50,
            ..ChunkConfig::default()
        })
    }

    /// 确定性翻译桩：把待译文本包一层
    fn deterministic(prompt: &str) -> Result<String, CompletionError> {
        Ok(format!("<{}>", prompt_text(prompt)))
    }

    async fn processor(
        client: Arc<ScriptedCompletionClient>,
        store: Arc<InMemoryProgressStore>,
    ) -> (ChapterProcessor, Arc<ProgressTracker>) {
        let tracker = ProgressTracker::open(store, true, EventPublisher::new().arc()).await.arc();
        tracker.start_translation(1).await;
        let translator = ChunkTranslator::new(client, RetryPolicy::immediate(3), PromptTemplate::default());
        let processor = ChapterProcessor::new(
            chunker(),
            translator,
            Arc::new(HtmlTextExtractor::new()),
            tracker.clone(),
        );
        (processor, tracker)
    }

    #[tokio::test]
    async fn test_full_run_joins_chunks_in_order() {
        let client = ScriptedCompletionClient::echo_with(deterministic).arc();
        let (processor, tracker) = processor(client.clone(), InMemoryProgressStore::new().arc()).await;

        let record = processor.process(&five_chunk_chapter(), "EN", "PL", 1, 0).await.unwrap();

        assert_eq!(record.number, 1);
        assert_eq!(record.title, "Opening");
        assert_eq!(client.call_count(), 5);
        let parts: Vec<&str> = record.content.split(CHUNK_SEPARATOR).collect();
        assert_eq!(parts.len(), 5);
        assert!(parts[0].starts_with("<0000 "));
        assert!(parts[0].contains("0001 "));
        assert!(parts[4].starts_with("<0008 "));
        assert!(parts[4].ends_with(".>"));
        assert!(tracker.is_chapter_completed(1).await);
        assert!(tracker.chunk_results(1).await.is_empty());
    }

    #[tokio::test]
    async fn test_resume_sends_only_remaining_chunks() {
        // 不中断的参照运行
        let reference_client = ScriptedCompletionClient::echo_with(deterministic).arc();
        let (reference, _) = processor(reference_client, InMemoryProgressStore::new().arc()).await;
        let expected = reference.process(&five_chunk_chapter(), "EN", "PL", 1, 0).await.unwrap();

        // 第 4 块始终失败，章节在完成 3 块后中止
        let store = InMemoryProgressStore::new().arc();
        let chunks = chunker().split(&HtmlTextExtractor::new().extract_text(&five_chunk_chapter().markup));
        assert_eq!(chunks.len(), 5);
        let fourth = chunks[3].clone();
        let failing = ScriptedCompletionClient::echo_with(move |prompt| {
            if prompt_text(prompt) == fourth {
                Err(CompletionError::Service("HTTP 503: unavailable".into()))
            } else {
                deterministic(prompt)
            }
        })
        .arc();
        {
            let (interrupted, tracker) = processor(failing, store.clone()).await;
            let err = interrupted.process(&five_chunk_chapter(), "EN", "PL", 1, 0).await.unwrap_err();
            assert!(matches!(err, TranslationError::Chunk { chapter: 1, chunk: 4, .. }));
            assert_eq!(tracker.get_chapter_progress(1).await, 3);
            assert_eq!(tracker.chapter(1).await.unwrap().error_count(), 1);
        }

        // 新进程：从持久化状态恢复
        let resumed_client = ScriptedCompletionClient::echo_with(deterministic).arc();
        let (resumed, tracker) = processor(resumed_client.clone(), store).await;
        let start = tracker.get_chapter_progress(1).await;
        assert_eq!(start, 3);

        let record = resumed.process(&five_chunk_chapter(), "EN", "PL", 1, start).await.unwrap();

        let sent: Vec<String> = resumed_client.prompts().iter().map(|p| prompt_text(p).to_string()).collect();
        assert_eq!(sent, vec![chunks[3].clone(), chunks[4].clone()]);
        assert_eq!(record.content, expected.content);
    }

    #[tokio::test]
    async fn test_exhausted_retries_leave_cursor_unchanged() {
        let client = ScriptedCompletionClient::always_failing("HTTP 500: boom").arc();
        let (processor, tracker) = processor(client.clone(), InMemoryProgressStore::new().arc()).await;

        let err = processor.process(&five_chunk_chapter(), "EN", "PL", 1, 0).await.unwrap_err();

        assert_eq!(client.call_count(), 3);
        assert_eq!(err.attempts(), Some(3));
        assert_eq!(tracker.get_chapter_progress(1).await, 0);
        assert!(!tracker.is_chapter_completed(1).await);
    }

    #[tokio::test]
    async fn test_empty_chapter_is_not_an_error() {
        let client = ScriptedCompletionClient::echo_with(deterministic).arc();
        let (processor, tracker) = processor(client.clone(), InMemoryProgressStore::new().arc()).await;

        let source = ChapterSource::new("cover", "<html><body><img src=\"cover.jpg\"/></body></html>");
        let record = processor.process(&source, "EN", "PL", 2, 0).await.unwrap();

        assert_eq!(record.number, 2);
        assert_eq!(record.title, "Chapter 2");
        assert!(record.content.is_empty());
        assert_eq!(client.call_count(), 0);
        assert!(tracker.is_chapter_completed(2).await);
    }

    #[tokio::test]
    async fn test_cursor_ahead_of_stored_results_is_clamped() {
        let client = ScriptedCompletionClient::echo_with(deterministic).arc();
        let (processor, tracker) = processor(client.clone(), InMemoryProgressStore::new().arc()).await;

        // 只有游标、没有译文（例如旧版本写入的进度）
        tracker.update_progress(1, 2, Some(5)).await.unwrap();
        let record = processor.process(&five_chunk_chapter(), "EN", "PL", 1, 2).await.unwrap();

        assert_eq!(client.call_count(), 5);
        assert_eq!(record.content.split(CHUNK_SEPARATOR).count(), 5);
    }

    #[tokio::test]
    async fn test_chunk_count_change_restarts_chapter() {
        let client = ScriptedCompletionClient::echo_with(deterministic).arc();
        let (processor, tracker) = processor(client.clone(), InMemoryProgressStore::new().arc()).await;

        tracker.start_chapter(1, 9).await.unwrap();
        tracker.commit_chunk(1, 0, "stale".into(), 9).await.unwrap();

        let record = processor.process(&five_chunk_chapter(), "EN", "PL", 1, 1).await.unwrap();

        assert_eq!(client.call_count(), 5);
        assert!(!record.content.contains("stale"));
    }
}

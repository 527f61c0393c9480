//! Translate Command Handlers

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::commands::{ChapterFailurePolicy, TranslateBook, TranslateBookResponse};
use crate::application::error::ApplicationError;
use crate::application::ports::{DocumentPort, RenderRequest, RendererPort};
use crate::application::services::{ChapterCache, ChapterProcessor, ProgressTracker};
use crate::domain::chapter::{sort_records, upsert_record};
use crate::domain::{extract_title, ChapterRecord};

// ============================================================================
// TranslateBook
// ============================================================================

/// TranslateBook Handler - 整书翻译编排
///
/// 按章节号顺序逐章处理：已完成且已缓存的章节跳过，其余从进度游标恢复；
/// 每完成一章保存章节缓存，最后把排序后的记录交给各渲染器
pub struct TranslateBookHandler {
    document: Arc<dyn DocumentPort>,
    processor: Arc<ChapterProcessor>,
    tracker: Arc<ProgressTracker>,
    cache: Arc<ChapterCache>,
    renderers: Vec<Arc<dyn RendererPort>>,
    failure_policy: ChapterFailurePolicy,
}

impl TranslateBookHandler {
    pub fn new(
        document: Arc<dyn DocumentPort>,
        processor: Arc<ChapterProcessor>,
        tracker: Arc<ProgressTracker>,
        cache: Arc<ChapterCache>,
        renderers: Vec<Arc<dyn RendererPort>>,
        failure_policy: ChapterFailurePolicy,
    ) -> Self {
        Self {
            document,
            processor,
            tracker,
            cache,
            renderers,
            failure_policy,
        }
    }

    pub async fn handle(&self, command: TranslateBook) -> Result<TranslateBookResponse, ApplicationError> {
        if command.from_chapter == 0 || command.to_chapter < command.from_chapter {
            return Err(ApplicationError::InvalidRange(format!(
                "from_chapter {} to_chapter {}",
                command.from_chapter, command.to_chapter
            )));
        }

        let chapters = self.document.chapters().await?;
        let total_chapters = chapters.len();
        tracing::info!(
            total_chapters,
            from_lang = %command.from_lang,
            to_lang = %command.to_lang,
            from_chapter = command.from_chapter,
            to_chapter = command.to_chapter.min(total_chapters),
            formats = ?self.renderers.iter().map(|r| r.format().as_str()).collect::<Vec<_>>(),
            "Starting translation"
        );

        self.tracker.start_translation(total_chapters).await;
        self.log_resume_summary().await;

        let mut records = self.cached_records(total_chapters).await;
        let mut placeholders: Vec<ChapterRecord> = Vec::new();
        let mut response = TranslateBookResponse::default();

        for (index, source) in chapters.iter().enumerate() {
            let number = index + 1;
            if number < command.from_chapter {
                continue;
            }
            if number > command.to_chapter {
                break;
            }

            tracing::info!(chapter = number, total_chapters, "Processing chapter");

            if let Some(chapter) = self.tracker.chapter(number).await {
                if chapter.is_completed() {
                    if records.iter().any(|r| r.number == number) {
                        tracing::info!(chapter = number, "Chapter already completed, skipping");
                        response.skipped += 1;
                        continue;
                    }
                    tracing::warn!(
                        chapter = number,
                        "Chapter was completed but is missing from the cache, retranslating"
                    );
                    self.tracker.reset_chapter(number, chapter.total_chunks()).await?;
                }
            }

            let start_chunk = self.tracker.get_chapter_progress(number).await;
            match self
                .processor
                .process(source, &command.from_lang, &command.to_lang, number, start_chunk)
                .await
            {
                Ok(record) => {
                    upsert_record(&mut records, record);
                    self.cache.save(&records).await;
                    response.translated += 1;
                    tracing::info!(chapter = number, "Chapter completed");
                }
                Err(e) => match self.failure_policy {
                    ChapterFailurePolicy::Abort => {
                        self.tracker.mark_interrupted(number).await;
                        tracing::error!(chapter = number, error = %e, "Translation interrupted");
                        tracing::info!("Progress saved. Resume with: --from-chapter {}", number);
                        return Err(ApplicationError::Interrupted {
                            chapter: number,
                            source: e,
                        });
                    }
                    ChapterFailurePolicy::Placeholder => {
                        tracing::warn!(chapter = number, error = %e, "Chapter failed, inserting placeholder");
                        let title = extract_title(&source.markup, number);
                        placeholders.push(ChapterRecord::placeholder(number, title, &e.to_string()));
                        response.failed.push(number);
                    }
                },
            }
        }

        let mut output_records = records;
        output_records.extend(placeholders);
        sort_records(&mut output_records);

        response.outputs = self.render_outputs(&command, &output_records).await;

        let progress = self.tracker.get_overall_progress().await;
        let book_complete = progress
            .as_ref()
            .map(|p| p.completed_chapters() >= p.total_chapters())
            .unwrap_or(false);
        if response.failed.is_empty() && book_complete {
            self.tracker.cleanup().await;
        } else if let Some(progress) = progress {
            tracing::info!(
                completed_chapters = progress.completed_chapters(),
                total_chapters = progress.total_chapters(),
                failed = ?response.failed,
                "Progress kept for a later run"
            );
        }

        tracing::info!(
            translated = response.translated,
            skipped = response.skipped,
            failed = response.failed.len(),
            outputs = response.outputs.len(),
            "Translation finished"
        );

        Ok(response)
    }

    async fn log_resume_summary(&self) {
        let Some(progress) = self.tracker.get_overall_progress().await else {
            return;
        };
        if progress.chapters().is_empty() {
            return;
        }
        tracing::info!(
            overall_progress = progress.overall_progress_percentage(),
            completed_chapters = progress.completed_chapters(),
            total_chapters = progress.total_chapters(),
            current_chapter = progress.current_chapter(),
            "Resuming from previous session"
        );
    }

    /// 读取章节缓存，只保留当前进度中已完成的章节
    ///
    /// 进度文件被清理或替换后，缓存里可能残留上一个作业的记录
    async fn cached_records(&self, total_chapters: usize) -> Vec<ChapterRecord> {
        let cached = self.cache.load().await;
        let cached_count = cached.len();

        let mut records = Vec::with_capacity(cached_count);
        for record in cached {
            if record.number <= total_chapters && self.tracker.is_chapter_completed(record.number).await {
                records.push(record);
            }
        }

        if records.len() < cached_count {
            tracing::warn!(
                discarded = cached_count - records.len(),
                kept = records.len(),
                "Discarding cached chapters not completed in current progress"
            );
        }
        records
    }

    /// 渲染失败只记录错误，不影响作业结果
    async fn render_outputs(&self, command: &TranslateBook, records: &[ChapterRecord]) -> Vec<PathBuf> {
        let book_title = self.document.title();
        let request = RenderRequest {
            records,
            from_lang: &command.from_lang,
            to_lang: &command.to_lang,
            output_base: &command.output_base,
            book_title: book_title.as_deref(),
        };

        tracing::info!(chapters = records.len(), "Generating outputs");

        let mut outputs = Vec::new();
        for renderer in &self.renderers {
            match renderer.render(&request).await {
                Ok(path) => {
                    tracing::info!(format = %renderer.format(), path = %path.display(), "Output generated");
                    outputs.push(path);
                }
                Err(e) => {
                    tracing::error!(format = %renderer.format(), error = %e, "Failed to generate output");
                }
            }
        }
        outputs
    }
}

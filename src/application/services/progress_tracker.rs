//! Progress Tracker - 进度跟踪服务
//!
//! 作业状态机 + 持久化：
//! - 构造时加载已有状态（存在则作业处于 Interrupted，可恢复）
//! - 每次变更在同一临界区内保存（auto_save）
//! - 保存失败只记录警告，不中断作业

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::ports::ProgressStorePort;
use crate::domain::progress::ProgressSummary;
use crate::domain::{ChapterProgress, ChapterState, JobState, ProgressError, TranslationProgress};
use crate::infrastructure::events::{EventPublisher, TranslationEvent};

struct TrackerState {
    progress: Option<TranslationProgress>,
    job: JobState,
}

/// 进度跟踪器
pub struct ProgressTracker {
    store: Arc<dyn ProgressStorePort>,
    auto_save: bool,
    state: Mutex<TrackerState>,
    events: Arc<EventPublisher>,
}

impl ProgressTracker {
    /// 打开跟踪器并加载已有状态
    ///
    /// 加载失败（如文件损坏）时记录警告并从零开始
    pub async fn open(
        store: Arc<dyn ProgressStorePort>,
        auto_save: bool,
        events: Arc<EventPublisher>,
    ) -> Self {
        let (progress, job) = match store.load().await {
            Ok(Some(progress)) => {
                tracing::info!(
                    location = %store.location(),
                    completed_chapters = progress.completed_chapters(),
                    total_chapters = progress.total_chapters(),
                    "Loaded existing progress"
                );
                (Some(progress), JobState::Interrupted)
            }
            Ok(None) => (None, JobState::NotStarted),
            Err(e) => {
                tracing::warn!(
                    location = %store.location(),
                    error = %e,
                    "Could not load existing progress, starting fresh"
                );
                (None, JobState::NotStarted)
            }
        };

        Self {
            store,
            auto_save,
            state: Mutex::new(TrackerState { progress, job }),
            events,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 开始作业；存在已加载状态时对账并恢复
    pub async fn start_translation(&self, total_chapters: usize) {
        let mut state = self.state.lock().await;

        let resumed = state.progress.is_some();
        let progress = state
            .progress
            .get_or_insert_with(|| TranslationProgress::new(total_chapters));
        if resumed {
            progress.resume(total_chapters);
            tracing::info!(
                completed_chapters = progress.completed_chapters(),
                total_chapters,
                current_chapter = progress.current_chapter(),
                "Resuming existing translation progress"
            );
        }
        let completed_chapters = progress.completed_chapters();
        state.job = JobState::InProgress;

        self.autosave(&state).await;
        self.events.publish(TranslationEvent::TranslationStarted {
            total_chapters,
            completed_chapters,
            resumed,
        });
    }

    /// 开始（或恢复）章节；已存在的章节保留游标
    pub async fn start_chapter(
        &self,
        chapter_number: usize,
        total_chunks: usize,
    ) -> Result<(), ProgressError> {
        let mut state = self.state.lock().await;
        let progress = state.progress.as_mut().ok_or(ProgressError::NotStarted)?;

        let event = Self::start_chapter_in(progress, chapter_number, total_chunks);

        self.autosave(&state).await;
        self.events.publish(event);
        Ok(())
    }

    fn start_chapter_in(
        progress: &mut TranslationProgress,
        chapter_number: usize,
        total_chunks: usize,
    ) -> TranslationEvent {
        let resumed = progress.start_chapter(chapter_number, total_chunks);
        let completed_chunks = progress
            .chapter(chapter_number)
            .map(|c| c.completed_chunks())
            .unwrap_or(0);

        if resumed {
            tracing::info!(
                chapter = chapter_number,
                from_chunk = completed_chunks + 1,
                total_chunks,
                "Resuming chapter"
            );
        }

        TranslationEvent::ChapterStarted {
            chapter: chapter_number,
            total_chunks,
            completed_chunks,
            resumed,
        }
    }

    /// 更新章节游标；章节不存在且给出 total_chunks 时自动开始
    pub async fn update_progress(
        &self,
        chapter_number: usize,
        completed_chunks: usize,
        total_chunks: Option<usize>,
    ) -> Result<(), ProgressError> {
        let mut state = self.state.lock().await;
        let progress = state.progress.as_mut().ok_or(ProgressError::NotStarted)?;

        let started = Self::ensure_chapter(progress, chapter_number, total_chunks)?;
        let chapter = progress.update_chapter(chapter_number, completed_chunks, total_chunks)?;
        let event = TranslationEvent::ProgressUpdated {
            chapter: chapter_number,
            completed_chunks: chapter.completed_chunks(),
            total_chunks: chapter.total_chunks(),
        };

        self.autosave(&state).await;
        if let Some(started) = started {
            self.events.publish(started);
        }
        self.events.publish(event);
        Ok(())
    }

    /// 提交块译文并推进游标（译文与游标在同一次保存中落盘）
    pub async fn commit_chunk(
        &self,
        chapter_number: usize,
        index: usize,
        translated: String,
        total_chunks: usize,
    ) -> Result<(), ProgressError> {
        let mut state = self.state.lock().await;
        let progress = state.progress.as_mut().ok_or(ProgressError::NotStarted)?;

        let started = Self::ensure_chapter(progress, chapter_number, Some(total_chunks))?;
        let chapter = progress.commit_chunk(chapter_number, index, translated, Some(total_chunks))?;
        let event = TranslationEvent::ProgressUpdated {
            chapter: chapter_number,
            completed_chunks: chapter.completed_chunks(),
            total_chunks: chapter.total_chunks(),
        };

        self.autosave(&state).await;
        if let Some(started) = started {
            self.events.publish(started);
        }
        self.events.publish(event);
        Ok(())
    }

    fn ensure_chapter(
        progress: &mut TranslationProgress,
        chapter_number: usize,
        total_chunks: Option<usize>,
    ) -> Result<Option<TranslationEvent>, ProgressError> {
        if progress.chapter(chapter_number).is_some() {
            return Ok(None);
        }
        let total = total_chunks.ok_or(ProgressError::ChapterNotStarted(chapter_number))?;
        Ok(Some(Self::start_chapter_in(progress, chapter_number, total)))
    }

    /// 标记章节完成，并重新计算作业完成章节数
    pub async fn complete_chapter(&self, chapter_number: usize) -> Result<(), ProgressError> {
        let mut state = self.state.lock().await;
        let progress = state.progress.as_mut().ok_or(ProgressError::NotStarted)?;

        if progress.complete_chapter(chapter_number).is_none() {
            tracing::debug!(chapter = chapter_number, "Complete requested for unknown chapter");
            return Ok(());
        }
        let event = TranslationEvent::ChapterCompleted {
            chapter: chapter_number,
            completed_chapters: progress.completed_chapters(),
            total_chapters: progress.total_chapters(),
        };

        self.autosave(&state).await;
        self.events.publish(event);
        Ok(())
    }

    /// 重置章节（丢弃游标与已存译文）
    pub async fn reset_chapter(
        &self,
        chapter_number: usize,
        total_chunks: usize,
    ) -> Result<(), ProgressError> {
        let mut state = self.state.lock().await;
        let progress = state.progress.as_mut().ok_or(ProgressError::NotStarted)?;

        progress.reset_chapter(chapter_number, total_chunks);
        tracing::info!(chapter = chapter_number, total_chunks, "Chapter progress reset");

        self.autosave(&state).await;
        self.events.publish(TranslationEvent::ChapterStarted {
            chapter: chapter_number,
            total_chunks,
            completed_chunks: 0,
            resumed: false,
        });
        Ok(())
    }

    /// 记录错误（仅诊断用途，不改变完成状态）
    pub async fn record_error(&self, chapter_number: usize, message: &str) {
        let mut state = self.state.lock().await;
        let Some(progress) = state.progress.as_mut() else {
            return;
        };
        let Some(error_count) = progress.record_error(chapter_number) else {
            return;
        };

        tracing::warn!(
            chapter = chapter_number,
            error_count,
            error = %message,
            "Translation error recorded"
        );

        self.autosave(&state).await;
        self.events.publish(TranslationEvent::ErrorRecorded {
            chapter: chapter_number,
            error: message.to_string(),
            error_count,
        });
    }

    /// 作业中断：保留持久化状态以便恢复
    pub async fn mark_interrupted(&self, chapter_number: usize) {
        let mut state = self.state.lock().await;
        if state.progress.is_none() {
            return;
        }
        state.job = JobState::Interrupted;

        self.autosave(&state).await;
        self.events.publish(TranslationEvent::JobInterrupted {
            chapter: chapter_number,
        });
    }

    /// 作业完成：删除持久化状态
    pub async fn cleanup(&self) {
        let mut state = self.state.lock().await;

        if let Err(e) = self.store.clear().await {
            tracing::warn!(location = %self.store.location(), error = %e, "Failed to remove progress");
        }
        state.progress = None;
        state.job = JobState::Completed;

        tracing::info!("Progress cleanup completed");
        self.events.publish(TranslationEvent::CleanupCompleted);
    }

    /// 立即保存（auto_save 关闭时使用）
    pub async fn save(&self) -> Result<(), ProgressError> {
        let state = self.state.lock().await;
        match state.progress.as_ref() {
            Some(progress) => self
                .store
                .save(progress)
                .await
                .map_err(|e| ProgressError::Save(e.to_string())),
            None => Ok(()),
        }
    }

    async fn autosave(&self, state: &TrackerState) {
        if !self.auto_save {
            return;
        }
        if let Some(progress) = state.progress.as_ref() {
            if let Err(e) = self.store.save(progress).await {
                tracing::warn!(
                    location = %self.store.location(),
                    error = %e,
                    "Failed to save progress"
                );
            }
        }
    }

    // Queries

    /// 章节已完成块数（恢复游标），未知章节返回 0
    pub async fn get_chapter_progress(&self, chapter_number: usize) -> usize {
        let state = self.state.lock().await;
        state
            .progress
            .as_ref()
            .and_then(|p| p.chapter(chapter_number))
            .map(|c| c.completed_chunks())
            .unwrap_or(0)
    }

    /// 进行中章节已存的块译文
    pub async fn chunk_results(&self, chapter_number: usize) -> Vec<String> {
        let state = self.state.lock().await;
        state
            .progress
            .as_ref()
            .and_then(|p| p.chapter(chapter_number))
            .map(|c| c.translated_chunks().to_vec())
            .unwrap_or_default()
    }

    pub async fn chapter(&self, chapter_number: usize) -> Option<ChapterProgress> {
        let state = self.state.lock().await;
        state
            .progress
            .as_ref()
            .and_then(|p| p.chapter(chapter_number))
            .cloned()
    }

    pub async fn chapter_state(&self, chapter_number: usize) -> ChapterState {
        let state = self.state.lock().await;
        state
            .progress
            .as_ref()
            .map(|p| p.chapter_state(chapter_number))
            .unwrap_or(ChapterState::NotStarted)
    }

    pub async fn is_chapter_completed(&self, chapter_number: usize) -> bool {
        self.chapter_state(chapter_number).await == ChapterState::Completed
    }

    pub async fn job_state(&self) -> JobState {
        self.state.lock().await.job
    }

    pub async fn get_overall_progress(&self) -> Option<TranslationProgress> {
        self.state.lock().await.progress.clone()
    }

    pub async fn get_progress_summary(&self) -> ProgressSummary {
        let state = self.state.lock().await;
        match state.progress.as_ref() {
            Some(progress) => progress.summary(state.job),
            None => ProgressSummary {
                status: state.job,
                ..ProgressSummary::not_started()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryProgressStore;

    async fn tracker_with(store: Arc<InMemoryProgressStore>) -> ProgressTracker {
        ProgressTracker::open(store, true, EventPublisher::new().arc()).await
    }

    #[tokio::test]
    async fn test_mutation_before_start_fails() {
        let tracker = tracker_with(InMemoryProgressStore::new().arc()).await;

        assert!(matches!(
            tracker.start_chapter(1, 3).await,
            Err(ProgressError::NotStarted)
        ));
        assert!(matches!(
            tracker.update_progress(1, 1, Some(3)).await,
            Err(ProgressError::NotStarted)
        ));
        assert!(matches!(
            tracker.complete_chapter(1).await,
            Err(ProgressError::NotStarted)
        ));
        // record_error 未开始时静默忽略
        tracker.record_error(1, "x").await;
        assert_eq!(tracker.job_state().await, JobState::NotStarted);
        assert_eq!(tracker.get_progress_summary().await.status, JobState::NotStarted);
    }

    #[tokio::test]
    async fn test_update_progress_auto_starts_chapter() {
        let tracker = tracker_with(InMemoryProgressStore::new().arc()).await;
        tracker.start_translation(3).await;

        assert!(matches!(
            tracker.update_progress(2, 1, None).await,
            Err(ProgressError::ChapterNotStarted(2))
        ));

        tracker.update_progress(2, 1, Some(4)).await.unwrap();
        assert_eq!(tracker.get_chapter_progress(2).await, 1);
        assert_eq!(tracker.chapter(2).await.unwrap().total_chunks(), 4);
    }

    #[tokio::test]
    async fn test_every_mutation_is_persisted() {
        let store = InMemoryProgressStore::new().arc();
        let tracker = tracker_with(store.clone()).await;

        tracker.start_translation(2).await;
        tracker.start_chapter(1, 2).await.unwrap();
        tracker.commit_chunk(1, 0, "uno".into(), 2).await.unwrap();
        assert_eq!(store.save_count(), 3);

        let saved = store.snapshot().await.unwrap();
        let chapter = saved.chapter(1).unwrap();
        assert_eq!(chapter.completed_chunks(), 1);
        assert_eq!(chapter.translated_chunks(), ["uno"]);
    }

    #[tokio::test]
    async fn test_auto_save_disabled_requires_explicit_save() {
        let store = InMemoryProgressStore::new().arc();
        let tracker = ProgressTracker::open(store.clone(), false, EventPublisher::new().arc()).await;

        tracker.start_translation(1).await;
        tracker.start_chapter(1, 1).await.unwrap();
        assert_eq!(store.save_count(), 0);

        tracker.save().await.unwrap();
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_save_failure_is_not_fatal() {
        let store = InMemoryProgressStore::new().arc();
        store.set_fail_saves(true);
        let tracker = tracker_with(store.clone()).await;

        tracker.start_translation(1).await;
        tracker.start_chapter(1, 2).await.unwrap();
        tracker.update_progress(1, 1, None).await.unwrap();
        assert_eq!(tracker.get_chapter_progress(1).await, 1);

        assert!(matches!(tracker.save().await, Err(ProgressError::Save(_))));
    }

    #[tokio::test]
    async fn test_resume_from_persisted_state() {
        let store = InMemoryProgressStore::new().arc();
        {
            let tracker = tracker_with(store.clone()).await;
            tracker.start_translation(3).await;
            tracker.start_chapter(1, 1).await.unwrap();
            tracker.complete_chapter(1).await.unwrap();
            tracker.start_chapter(2, 5).await.unwrap();
            for i in 0..3 {
                tracker.commit_chunk(2, i, format!("t{}", i), 5).await.unwrap();
            }
        }

        let tracker = tracker_with(store.clone()).await;
        assert_eq!(tracker.job_state().await, JobState::Interrupted);

        tracker.start_translation(3).await;
        assert_eq!(tracker.job_state().await, JobState::InProgress);

        // start_chapter 不会把游标重置为 0
        tracker.start_chapter(2, 5).await.unwrap();
        assert_eq!(tracker.get_chapter_progress(2).await, 3);
        assert_eq!(tracker.chunk_results(2).await, vec!["t0", "t1", "t2"]);
        assert!(tracker.is_chapter_completed(1).await);
        assert!(!tracker.is_chapter_completed(2).await);

        let progress = tracker.get_overall_progress().await.unwrap();
        assert_eq!(progress.completed_chapters(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_state_starts_fresh() {
        let store = InMemoryProgressStore::corrupted().arc();
        let tracker = tracker_with(store.clone()).await;
        assert_eq!(tracker.job_state().await, JobState::NotStarted);

        tracker.start_translation(4).await;
        let progress = tracker.get_overall_progress().await.unwrap();
        assert_eq!(progress.completed_chapters(), 0);
        assert!(progress.chapters().is_empty());
    }

    #[tokio::test]
    async fn test_completed_chapters_tracks_completion() {
        let tracker = tracker_with(InMemoryProgressStore::new().arc()).await;
        tracker.start_translation(3).await;

        let mut last = 0;
        for chapter in 1..=3 {
            tracker.start_chapter(chapter, 2).await.unwrap();
            tracker.update_progress(chapter, 1, None).await.unwrap();
            tracker.complete_chapter(chapter).await.unwrap();

            let progress = tracker.get_overall_progress().await.unwrap();
            let counted = progress.chapters().values().filter(|c| c.is_completed()).count();
            assert_eq!(progress.completed_chapters(), counted);
            assert!(progress.completed_chapters() >= last);
            last = progress.completed_chapters();
        }
        assert_eq!(last, 3);
    }

    #[tokio::test]
    async fn test_record_error_does_not_change_completion() {
        let tracker = tracker_with(InMemoryProgressStore::new().arc()).await;
        let mut events = tracker.events.subscribe();
        tracker.start_translation(1).await;
        tracker.start_chapter(1, 3).await.unwrap();
        tracker.update_progress(1, 1, None).await.unwrap();

        tracker.record_error(1, "boom").await;
        tracker.record_error(1, "boom again").await;

        let chapter = tracker.chapter(1).await.unwrap();
        assert_eq!(chapter.error_count(), 2);
        assert_eq!(chapter.completed_chunks(), 1);

        let mut recorded = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let TranslationEvent::ErrorRecorded { error_count, .. } = event {
                recorded.push(error_count);
            }
        }
        assert_eq!(recorded, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_interrupt_and_cleanup() {
        let store = InMemoryProgressStore::new().arc();
        let tracker = tracker_with(store.clone()).await;
        tracker.start_translation(2).await;
        tracker.start_chapter(1, 2).await.unwrap();

        tracker.mark_interrupted(1).await;
        assert_eq!(tracker.job_state().await, JobState::Interrupted);
        assert!(store.snapshot().await.is_some());

        tracker.cleanup().await;
        assert_eq!(tracker.job_state().await, JobState::Completed);
        assert!(store.snapshot().await.is_none());
        assert!(tracker.get_overall_progress().await.is_none());
        assert_eq!(tracker.get_chapter_progress(1).await, 0);
    }

    #[tokio::test]
    async fn test_summary_reports_current_chapter() {
        let tracker = tracker_with(InMemoryProgressStore::new().arc()).await;
        tracker.start_translation(2).await;
        tracker.start_chapter(2, 4).await.unwrap();
        tracker.update_progress(2, 2, None).await.unwrap();

        let summary = tracker.get_progress_summary().await;
        assert_eq!(summary.status, JobState::InProgress);
        assert_eq!(summary.total_chapters, 2);
        let current = summary.current_chapter_progress.unwrap();
        assert_eq!(current.chapter_number, 2);
        assert_eq!(current.progress, 50.0);
    }
}

//! Progress Context - Aggregate Root

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{
    timestamp_to_datetime, unix_now, ChapterProgress, ChapterState, ChapterSummary, JobState,
    ProgressError, ProgressSummary,
};

/// 作业进度聚合根（持久化记录）
///
/// 不变量:
/// - completed_chapters 总是由章节记录重新计算，从不单独递增
/// - chapters 以章节编号为键（JSON 中为字符串键）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationProgress {
    total_chapters: usize,
    completed_chapters: usize,
    current_chapter: usize,
    start_time: f64,
    last_update_time: f64,
    #[serde(default)]
    chapters: BTreeMap<usize, ChapterProgress>,
}

impl TranslationProgress {
    /// 创建新作业
    pub fn new(total_chapters: usize) -> Self {
        let now = unix_now();
        Self {
            total_chapters,
            completed_chapters: 0,
            current_chapter: 1,
            start_time: now,
            last_update_time: now,
            chapters: BTreeMap::new(),
        }
    }

    /// 恢复已有作业：更新总章节数并重新计算完成计数
    pub fn resume(&mut self, total_chapters: usize) {
        self.total_chapters = total_chapters;
        self.recompute_completed();
        self.touch();
    }

    /// 开始（或恢复）章节，返回是否为恢复
    ///
    /// 已存在的章节只更新总块数，不重置游标
    pub fn start_chapter(&mut self, chapter_number: usize, total_chunks: usize) -> bool {
        let resumed = match self.chapters.get_mut(&chapter_number) {
            Some(chapter) => {
                chapter.set_total_chunks(total_chunks);
                true
            }
            None => {
                self.chapters
                    .insert(chapter_number, ChapterProgress::new(chapter_number, total_chunks));
                false
            }
        };
        self.current_chapter = chapter_number;
        self.recompute_completed();
        self.touch();
        resumed
    }

    /// 更新章节游标
    pub fn update_chapter(
        &mut self,
        chapter_number: usize,
        completed_chunks: usize,
        total_chunks: Option<usize>,
    ) -> Result<&ChapterProgress, ProgressError> {
        let chapter = self
            .chapters
            .get_mut(&chapter_number)
            .ok_or(ProgressError::ChapterNotStarted(chapter_number))?;
        if let Some(total) = total_chunks {
            chapter.set_total_chunks(total);
        }
        chapter.set_completed_chunks(completed_chunks);
        self.after_chapter_change();
        self.chapter_ref(chapter_number)
    }

    /// 记录块译文并推进游标
    pub fn commit_chunk(
        &mut self,
        chapter_number: usize,
        index: usize,
        translated: String,
        total_chunks: Option<usize>,
    ) -> Result<&ChapterProgress, ProgressError> {
        let chapter = self
            .chapters
            .get_mut(&chapter_number)
            .ok_or(ProgressError::ChapterNotStarted(chapter_number))?;
        if let Some(total) = total_chunks {
            chapter.set_total_chunks(total);
        }
        chapter.commit_chunk(index, translated);
        self.after_chapter_change();
        self.chapter_ref(chapter_number)
    }

    /// 标记章节完成；章节不存在时返回 None
    pub fn complete_chapter(&mut self, chapter_number: usize) -> Option<&ChapterProgress> {
        self.chapters.get_mut(&chapter_number)?.complete();
        self.after_chapter_change();
        self.chapters.get(&chapter_number)
    }

    /// 重置章节游标与已存译文
    pub fn reset_chapter(&mut self, chapter_number: usize, total_chunks: usize) -> &ChapterProgress {
        self.chapters
            .entry(chapter_number)
            .and_modify(|chapter| chapter.reset(total_chunks))
            .or_insert_with(|| ChapterProgress::new(chapter_number, total_chunks));
        self.current_chapter = chapter_number;
        self.after_chapter_change();
        &self.chapters[&chapter_number]
    }

    /// 记录错误，返回新的错误计数；章节不存在时返回 None
    pub fn record_error(&mut self, chapter_number: usize) -> Option<u32> {
        let count = self.chapters.get_mut(&chapter_number)?.record_error();
        self.touch();
        Some(count)
    }

    fn chapter_ref(&self, chapter_number: usize) -> Result<&ChapterProgress, ProgressError> {
        self.chapters
            .get(&chapter_number)
            .ok_or(ProgressError::ChapterNotStarted(chapter_number))
    }

    fn after_chapter_change(&mut self) {
        self.recompute_completed();
        self.touch();
    }

    fn recompute_completed(&mut self) {
        self.completed_chapters = self.chapters.values().filter(|c| c.is_completed()).count();
    }

    fn touch(&mut self) {
        self.last_update_time = unix_now();
    }

    // Getters
    pub fn total_chapters(&self) -> usize {
        self.total_chapters
    }

    pub fn completed_chapters(&self) -> usize {
        self.completed_chapters
    }

    pub fn current_chapter(&self) -> usize {
        self.current_chapter
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn last_update_time(&self) -> f64 {
        self.last_update_time
    }

    pub fn chapters(&self) -> &BTreeMap<usize, ChapterProgress> {
        &self.chapters
    }

    pub fn chapter(&self, chapter_number: usize) -> Option<&ChapterProgress> {
        self.chapters.get(&chapter_number)
    }

    /// 章节状态；没有记录的章节尚未开始
    pub fn chapter_state(&self, chapter_number: usize) -> ChapterState {
        self.chapter(chapter_number)
            .map(ChapterProgress::state)
            .unwrap_or(ChapterState::NotStarted)
    }

    pub fn total_errors(&self) -> u32 {
        self.chapters.values().map(|c| c.error_count()).sum()
    }

    pub fn overall_progress_percentage(&self) -> f64 {
        if self.total_chapters == 0 {
            return 0.0;
        }
        self.completed_chapters as f64 / self.total_chapters as f64 * 100.0
    }

    pub fn elapsed_time(&self) -> f64 {
        self.last_update_time - self.start_time
    }

    pub fn estimate_total_remaining_time(&self) -> Option<f64> {
        if self.completed_chapters == 0 {
            return None;
        }
        let elapsed = self.elapsed_time();
        if elapsed <= 0.0 {
            return None;
        }
        let chapters_per_second = self.completed_chapters as f64 / elapsed;
        let remaining = self.total_chapters.saturating_sub(self.completed_chapters);
        Some(remaining as f64 / chapters_per_second)
    }

    /// 生成进度摘要
    pub fn summary(&self, status: JobState) -> ProgressSummary {
        let current_chapter_progress = self.chapter(self.current_chapter).map(|c| ChapterSummary {
            chapter_number: c.chapter_number(),
            progress: c.progress_percentage(),
            completed_chunks: c.completed_chunks(),
            total_chunks: c.total_chunks(),
            estimated_remaining_secs: c.estimate_remaining_time(),
            error_count: c.error_count(),
        });

        ProgressSummary {
            status,
            overall_progress: self.overall_progress_percentage(),
            completed_chapters: self.completed_chapters,
            total_chapters: self.total_chapters,
            current_chapter: self.current_chapter,
            elapsed_secs: self.elapsed_time(),
            estimated_remaining_secs: self.estimate_total_remaining_time(),
            started_at: timestamp_to_datetime(self.start_time),
            last_update: timestamp_to_datetime(self.last_update_time),
            total_errors: self.total_errors(),
            current_chapter_progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job() {
        let progress = TranslationProgress::new(10);
        assert_eq!(progress.total_chapters(), 10);
        assert_eq!(progress.completed_chapters(), 0);
        assert_eq!(progress.current_chapter(), 1);
        assert!(progress.chapters().is_empty());
    }

    #[test]
    fn test_start_chapter_is_idempotent() {
        let mut progress = TranslationProgress::new(3);
        assert!(!progress.start_chapter(1, 5));
        progress.update_chapter(1, 3, None).unwrap();

        assert!(progress.start_chapter(1, 5));
        assert_eq!(progress.chapter(1).unwrap().completed_chunks(), 3);
    }

    #[test]
    fn test_chapter_state_transitions() {
        let mut progress = TranslationProgress::new(2);
        assert_eq!(progress.chapter_state(1), ChapterState::NotStarted);

        progress.start_chapter(1, 2);
        assert_eq!(progress.chapter_state(1), ChapterState::InProgress);

        progress.complete_chapter(1);
        assert_eq!(progress.chapter_state(1), ChapterState::Completed);
        assert_eq!(progress.chapter_state(2), ChapterState::NotStarted);
    }

    #[test]
    fn test_update_unknown_chapter_fails() {
        let mut progress = TranslationProgress::new(3);
        let err = progress.update_chapter(2, 1, Some(4)).unwrap_err();
        assert!(matches!(err, ProgressError::ChapterNotStarted(2)));
    }

    #[test]
    fn test_completed_count_is_recomputed() {
        let mut progress = TranslationProgress::new(3);
        progress.start_chapter(1, 2);
        progress.start_chapter(2, 2);

        progress.complete_chapter(1);
        assert_eq!(progress.completed_chapters(), 1);

        // 游标到达总数同样算完成
        progress.update_chapter(2, 2, None).unwrap();
        assert_eq!(progress.completed_chapters(), 2);

        // 重复完成不会重复计数
        progress.complete_chapter(1);
        assert_eq!(progress.completed_chapters(), 2);
        assert!(progress.complete_chapter(9).is_none());
    }

    #[test]
    fn test_resume_reconciles_drifted_counter() {
        let json = r#"{
            "total_chapters": 5,
            "completed_chapters": 4,
            "current_chapter": 2,
            "start_time": 10.0,
            "last_update_time": 20.0,
            "chapters": {
                "1": {"chapter_number": 1, "total_chunks": 2, "completed_chunks": 2,
                      "start_time": 10.0, "last_update_time": 15.0, "error_count": 0},
                "2": {"chapter_number": 2, "total_chunks": 3, "completed_chunks": 1,
                      "start_time": 15.0, "last_update_time": 20.0, "error_count": 1}
            }
        }"#;
        let mut progress: TranslationProgress = serde_json::from_str(json).unwrap();
        progress.resume(6);

        assert_eq!(progress.total_chapters(), 6);
        assert_eq!(progress.completed_chapters(), 1);
        assert_eq!(progress.chapter(2).unwrap().completed_chunks(), 1);
        assert_eq!(progress.total_errors(), 1);
    }

    #[test]
    fn test_chapter_keys_persist_as_strings() {
        let mut progress = TranslationProgress::new(2);
        progress.start_chapter(7, 1);
        let json = serde_json::to_value(&progress).unwrap();
        assert!(json["chapters"].get("7").is_some());
        assert_eq!(json["chapters"]["7"]["total_chunks"], 1);
    }

    #[test]
    fn test_reset_chapter_restarts_cursor() {
        let mut progress = TranslationProgress::new(1);
        progress.start_chapter(1, 2);
        progress.complete_chapter(1);
        assert_eq!(progress.completed_chapters(), 1);

        let chapter = progress.reset_chapter(1, 4);
        assert_eq!(chapter.completed_chunks(), 0);
        assert_eq!(chapter.total_chunks(), 4);
        assert_eq!(progress.completed_chapters(), 0);
    }

    #[test]
    fn test_summary_contains_current_chapter() {
        let mut progress = TranslationProgress::new(4);
        progress.start_chapter(2, 4);
        progress.commit_chunk(2, 0, "x".into(), None).unwrap();
        progress.record_error(2);

        let summary = progress.summary(JobState::InProgress);
        assert_eq!(summary.status, JobState::InProgress);
        assert_eq!(summary.current_chapter, 2);
        assert_eq!(summary.total_errors, 1);
        let current = summary.current_chapter_progress.unwrap();
        assert_eq!(current.completed_chunks, 1);
        assert_eq!(current.progress, 25.0);
    }
}

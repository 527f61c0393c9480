//! Progress Context - Entities

use serde::{Deserialize, Serialize};

use super::{unix_now, ChapterState};

/// 章节进度
///
/// 不变量:
/// - completed_chunks <= total_chunks
/// - translated_chunks.len() <= completed_chunks
/// - completed_chunks == total_chunks 时章节完成
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterProgress {
    chapter_number: usize,
    total_chunks: usize,
    completed_chunks: usize,
    start_time: f64,
    last_update_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    estimated_completion_time: Option<f64>,
    #[serde(default)]
    error_count: u32,
    /// 进行中章节已翻译块的译文（块 [0, completed_chunks)）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    translated_chunks: Vec<String>,
}

impl ChapterProgress {
    pub fn new(chapter_number: usize, total_chunks: usize) -> Self {
        let now = unix_now();
        Self {
            chapter_number,
            total_chunks,
            completed_chunks: 0,
            start_time: now,
            last_update_time: now,
            estimated_completion_time: None,
            error_count: 0,
            translated_chunks: Vec::new(),
        }
    }

    // Getters
    pub fn chapter_number(&self) -> usize {
        self.chapter_number
    }

    pub fn total_chunks(&self) -> usize {
        self.total_chunks
    }

    pub fn completed_chunks(&self) -> usize {
        self.completed_chunks
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn last_update_time(&self) -> f64 {
        self.last_update_time
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn translated_chunks(&self) -> &[String] {
        &self.translated_chunks
    }

    pub fn state(&self) -> ChapterState {
        if self.is_completed() {
            ChapterState::Completed
        } else {
            ChapterState::InProgress
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_chunks >= self.total_chunks
    }

    pub fn progress_percentage(&self) -> f64 {
        if self.total_chunks == 0 {
            return 0.0;
        }
        self.completed_chunks as f64 / self.total_chunks as f64 * 100.0
    }

    pub fn elapsed_time(&self) -> f64 {
        self.last_update_time - self.start_time
    }

    /// 按已完成块的速度估算剩余秒数
    pub fn estimate_remaining_time(&self) -> Option<f64> {
        if self.completed_chunks == 0 {
            return None;
        }
        let elapsed = self.elapsed_time();
        if elapsed <= 0.0 {
            return None;
        }
        let chunks_per_second = self.completed_chunks as f64 / elapsed;
        let remaining = self.total_chunks.saturating_sub(self.completed_chunks);
        Some(remaining as f64 / chunks_per_second)
    }

    // Mutations

    /// 更新总块数（恢复时块数可能变化），保持游标不越界
    pub fn set_total_chunks(&mut self, total_chunks: usize) {
        self.total_chunks = total_chunks;
        self.set_completed_chunks(self.completed_chunks);
    }

    /// 设置游标；超出的已翻译块被丢弃
    pub fn set_completed_chunks(&mut self, completed_chunks: usize) {
        self.completed_chunks = completed_chunks.min(self.total_chunks);
        self.translated_chunks.truncate(self.completed_chunks);
        self.touch();
    }

    /// 记录块 `index` 的译文并把游标推进到 `index + 1`
    ///
    /// 译文与游标不连续时（中间缺块）清空已存译文，恢复时将从头重译
    pub fn commit_chunk(&mut self, index: usize, translated: String) {
        if index > self.translated_chunks.len() {
            self.translated_chunks.clear();
        } else {
            self.translated_chunks.truncate(index);
            self.translated_chunks.push(translated);
        }
        self.set_completed_chunks(index + 1);
    }

    /// 标记完成：游标设为总块数，释放已存译文
    pub fn complete(&mut self) {
        self.completed_chunks = self.total_chunks;
        self.translated_chunks.clear();
        self.estimated_completion_time = Some(unix_now());
        self.touch();
    }

    /// 重置章节（块数变化或缓存丢失时重译）
    pub fn reset(&mut self, total_chunks: usize) {
        let now = unix_now();
        self.total_chunks = total_chunks;
        self.completed_chunks = 0;
        self.translated_chunks.clear();
        self.estimated_completion_time = None;
        self.start_time = now;
        self.last_update_time = now;
    }

    pub fn record_error(&mut self) -> u32 {
        self.error_count += 1;
        self.touch();
        self.error_count
    }

    pub fn touch(&mut self) {
        self.last_update_time = unix_now();
    }
}

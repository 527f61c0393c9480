//! Progress Context - Value Objects

use chrono::{DateTime, Utc};
use serde::Serialize;

/// 当前 Unix 时间（秒，含小数）
pub fn unix_now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Unix 秒转换为 UTC 时间
pub fn timestamp_to_datetime(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1_000_000_000.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

/// 作业状态
///
/// NotStarted → InProgress → Completed（终态）
/// InProgress → Interrupted（保留在磁盘上，可恢复为 InProgress）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    #[default]
    NotStarted,
    InProgress,
    Interrupted,
    Completed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::NotStarted => "not_started",
            JobState::InProgress => "in_progress",
            JobState::Interrupted => "interrupted",
            JobState::Completed => "completed",
        }
    }

    /// 是否存在可恢复的持久化状态
    pub fn is_resumable(&self) -> bool {
        matches!(self, JobState::InProgress | JobState::Interrupted)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 章节状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterState {
    NotStarted,
    InProgress,
    Completed,
}

impl ChapterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChapterState::NotStarted => "not_started",
            ChapterState::InProgress => "in_progress",
            ChapterState::Completed => "completed",
        }
    }
}

impl std::fmt::Display for ChapterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 当前章节的进度摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterSummary {
    pub chapter_number: usize,
    pub progress: f64,
    pub completed_chunks: usize,
    pub total_chunks: usize,
    pub estimated_remaining_secs: Option<f64>,
    pub error_count: u32,
}

/// 作业进度摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSummary {
    pub status: JobState,
    pub overall_progress: f64,
    pub completed_chapters: usize,
    pub total_chapters: usize,
    pub current_chapter: usize,
    pub elapsed_secs: f64,
    pub estimated_remaining_secs: Option<f64>,
    pub started_at: Option<DateTime<Utc>>,
    pub last_update: Option<DateTime<Utc>>,
    pub total_errors: u32,
    pub current_chapter_progress: Option<ChapterSummary>,
}

impl ProgressSummary {
    /// 尚未开始的作业
    pub fn not_started() -> Self {
        Self {
            status: JobState::NotStarted,
            overall_progress: 0.0,
            completed_chapters: 0,
            total_chapters: 0,
            current_chapter: 0,
            elapsed_secs: 0.0,
            estimated_remaining_secs: None,
            started_at: None,
            last_update: None,
            total_errors: 0,
            current_chapter_progress: None,
        }
    }
}

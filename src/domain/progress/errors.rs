//! Progress Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Translation not started. Call start_translation() first")]
    NotStarted,

    #[error("Chapter {0} not started and no total_chunks provided")]
    ChapterNotStarted(usize),

    #[error("Failed to save progress: {0}")]
    Save(String),
}

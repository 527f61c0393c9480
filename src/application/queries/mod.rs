//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：章节概览

mod show_chapters_queries;

pub mod handlers;

pub use show_chapters_queries::*;

//! Query Handlers 实现

mod show_chapters_handlers;

pub use show_chapters_handlers::*;

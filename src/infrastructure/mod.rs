//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod events;
pub mod memory;
pub mod persistence;

pub use events::{EventPublisher, TranslationEvent};
pub use memory::{InMemoryChapterStore, InMemoryDocument, InMemoryProgressStore};
pub use persistence::{chapter_cache_path, JsonChapterStore, JsonProgressStore};

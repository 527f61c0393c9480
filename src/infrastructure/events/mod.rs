//! Events - 可观测事件
//!
//! 进度状态变更通过广播通道发布，CLI 与测试订阅

mod publisher;

pub use publisher::{EventPublisher, TranslationEvent};

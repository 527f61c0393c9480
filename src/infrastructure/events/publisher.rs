//! Event Publisher Implementation
//!
//! 翻译进度事件广播

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// 翻译进度事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum TranslationEvent {
    /// 作业开始（或从持久化状态恢复）
    TranslationStarted {
        total_chapters: usize,
        completed_chapters: usize,
        resumed: bool,
    },
    /// 章节开始（或恢复）
    ChapterStarted {
        chapter: usize,
        total_chunks: usize,
        completed_chunks: usize,
        resumed: bool,
    },
    /// 章节游标推进
    ProgressUpdated {
        chapter: usize,
        completed_chunks: usize,
        total_chunks: usize,
    },
    /// 章节完成
    ChapterCompleted {
        chapter: usize,
        completed_chapters: usize,
        total_chapters: usize,
    },
    /// 错误记录
    ErrorRecorded {
        chapter: usize,
        error: String,
        error_count: u32,
    },
    /// 作业中断，状态保留
    JobInterrupted { chapter: usize },
    /// 持久化状态已清理
    CleanupCompleted,
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<TranslationEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<TranslationEvent> {
        self.channel.subscribe()
    }

    /// 发布事件；没有订阅者时丢弃
    pub fn publish(&self, event: TranslationEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::debug!(error = %e, "Failed to publish event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe();

        publisher.publish(TranslationEvent::JobInterrupted { chapter: 3 });
        publisher.publish(TranslationEvent::CleanupCompleted);

        assert_eq!(rx.recv().await.unwrap(), TranslationEvent::JobInterrupted { chapter: 3 });
        assert_eq!(rx.recv().await.unwrap(), TranslationEvent::CleanupCompleted);
    }

    #[test]
    fn test_publish_without_receivers_is_noop() {
        let publisher = EventPublisher::new();
        publisher.publish(TranslationEvent::CleanupCompleted);
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = TranslationEvent::ProgressUpdated {
            chapter: 1,
            completed_chunks: 2,
            total_chunks: 5,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "ProgressUpdated");
        assert_eq!(json["data"]["completed_chunks"], 2);
    }
}

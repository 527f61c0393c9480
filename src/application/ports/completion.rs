//! Completion Port - LLM 补全服务抽象
//!
//! 定义翻译后端的抽象接口，具体实现在 infrastructure/adapters/llm

use async_trait::async_trait;
use thiserror::Error;

/// 补全服务错误
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Rate limit exceeded (429 Too Many Requests): {0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    Service(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty response from completion service")]
    EmptyResponse,
}

/// Completion Port
///
/// 接收提示词，返回补全文本或失败
#[async_trait]
pub trait CompletionPort: Send + Sync {
    /// 执行一次补全请求
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// 提供方名称（日志用）
    fn provider(&self) -> &'static str;

    /// 模型名称（日志用）
    fn model(&self) -> &str;
}

//! Chunk Translator - 单块翻译与重试策略
//!
//! 重试规则:
//! - 限流/配额错误：等待 rate_limit_delay 后重试
//! - 其他错误（含空响应）：等待 error_delay 后重试
//! - 最后一次失败不再等待，直接返回 TranslationError

use std::sync::Arc;
use std::time::Duration;

use crate::application::error::TranslationError;
use crate::application::ports::{CompletionError, CompletionPort};

/// 默认提示词模板
pub const DEFAULT_PROMPT_TEMPLATE: &str = "You are a professional {from_lang}-to-{to_lang} translator. \
Translate the following text naturally and fluently to {to_lang}. \
{extra_prompts}. \
Maintain readability and consistency with the source text while making it read naturally in {to_lang}. \
Do not add explanations, comments, or notes - only provide the translation.\n\n\
Text to translate:\n{text}";

/// 限流标记（小写匹配）
const RATE_LIMIT_MARKERS: &[&str] = &["rate limit", "ratelimit", "quota", "too many requests", "429"];

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// 限流/配额耗尽
    RateLimited,
    /// 其他瞬时错误
    Transient,
}

/// 重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 限流后的等待时间
    pub rate_limit_delay: Duration,
    /// 其他错误后的等待时间
    pub error_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_delay: Duration::from_secs(180),
            error_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, rate_limit_delay: Duration, error_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            rate_limit_delay,
            error_delay,
        }
    }

    /// 无等待（测试用）
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    /// 按错误文本分类
    pub fn classify(&self, error: &CompletionError) -> RetryClass {
        let message = error.to_string().to_lowercase();
        if RATE_LIMIT_MARKERS.iter().any(|m| message.contains(m)) {
            RetryClass::RateLimited
        } else {
            RetryClass::Transient
        }
    }

    pub fn delay_for(&self, class: RetryClass) -> Duration {
        match class {
            RetryClass::RateLimited => self.rate_limit_delay,
            RetryClass::Transient => self.error_delay,
        }
    }
}

/// 提示词模板
///
/// 占位符: {from_lang} {to_lang} {extra_prompts} {text}
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    extra_prompts: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT_TEMPLATE, "")
    }
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>, extra_prompts: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            extra_prompts: extra_prompts.into(),
        }
    }

    pub fn with_extra_prompts(mut self, extra_prompts: impl Into<String>) -> Self {
        self.extra_prompts = extra_prompts.into();
        self
    }

    pub fn render(&self, text: &str, from_lang: &str, to_lang: &str) -> String {
        // {text} 最后替换，避免正文中的花括号被当作占位符
        self.template
            .replace("{from_lang}", from_lang)
            .replace("{to_lang}", to_lang)
            .replace("{extra_prompts}", &self.extra_prompts)
            .replace("{text}", text)
    }
}

/// 单块翻译器
pub struct ChunkTranslator {
    client: Arc<dyn CompletionPort>,
    policy: RetryPolicy,
    prompt: PromptTemplate,
}

impl ChunkTranslator {
    pub fn new(client: Arc<dyn CompletionPort>, policy: RetryPolicy, prompt: PromptTemplate) -> Self {
        Self {
            client,
            policy,
            prompt,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 翻译一个块，在尝试预算内重试
    pub async fn translate(
        &self,
        chunk_text: &str,
        from_lang: &str,
        to_lang: &str,
    ) -> Result<String, TranslationError> {
        let prompt = self.prompt.render(chunk_text, from_lang, to_lang);
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self.client.complete(&prompt).await {
                Ok(text) if !text.trim().is_empty() => return Ok(text.trim().to_string()),
                Ok(_) => CompletionError::EmptyResponse,
                Err(e) => e,
            };

            if attempt >= max_attempts {
                tracing::error!(
                    provider = self.client.provider(),
                    attempts = attempt,
                    error = %error,
                    "Chunk translation failed"
                );
                return Err(TranslationError::RetriesExhausted {
                    attempts: attempt,
                    last_error: error.to_string(),
                });
            }

            let class = self.policy.classify(&error);
            let delay = self.policy.delay_for(class);
            match class {
                RetryClass::RateLimited => tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_secs = delay.as_secs(),
                    "Rate limit hit, waiting before retry"
                ),
                RetryClass::Transient => tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_secs = delay.as_secs(),
                    error = %error,
                    "Completion request failed, retrying"
                ),
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

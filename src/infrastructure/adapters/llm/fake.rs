//! Scripted Completion Client - 用于测试的补全客户端
//!
//! 按脚本依次返回预设结果，脚本耗尽后交给回退函数

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::application::ports::{CompletionError, CompletionPort};

type Responder = Box<dyn Fn(&str) -> Result<String, CompletionError> + Send + Sync>;

const PROMPT_TEXT_MARKER: &str = "Text to translate:\n";

/// 取出提示词中待翻译的原文部分
pub fn prompt_text(prompt: &str) -> &str {
    match prompt.rfind(PROMPT_TEXT_MARKER) {
        Some(pos) => &prompt[pos + PROMPT_TEXT_MARKER.len()..],
        None => prompt,
    }
}

/// 脚本化补全客户端
#[derive(Default)]
pub struct ScriptedCompletionClient {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    fallback: Option<Responder>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次调用都交给 responder 处理
    pub fn echo_with<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, CompletionError> + Send + Sync + 'static,
    {
        Self {
            fallback: Some(Box::new(responder)),
            ..Self::default()
        }
    }

    /// 每次调用都返回 Service 错误
    pub fn always_failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::echo_with(move |_| Err(CompletionError::Service(message.clone())))
    }

    pub fn then_ok(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    pub fn then_err(self, err: CompletionError) -> Self {
        self.push(Err(err))
    }

    fn push(self, result: Result<String, CompletionError>) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(result);
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// 已收到的全部提示词
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CompletionPort for ScriptedCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match (scripted, &self.fallback) {
            (Some(result), _) => result,
            (None, Some(responder)) => responder(prompt),
            (None, None) => Err(CompletionError::Service("script exhausted".to_string())),
        }
    }

    fn provider(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

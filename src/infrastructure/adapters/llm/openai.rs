//! OpenAI Client - Chat Completions API
//!
//! POST {base_url}/chat/completions
//! Request: {"model": "...", "messages": [{"role": "user", "content": "..."}], "temperature": 0.2}
//! Response: {"choices": [{"message": {"content": "..."}}]}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{build_client, map_send_error, read_json};
use crate::application::ports::{CompletionError, CompletionPort};
use crate::config::OpenAiConfig;

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Chat Completions 请求体（OpenAI 与 Azure 共用）
#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl<'a> ChatRequest<'a> {
    pub fn user(prompt: &'a str, temperature: f32, max_tokens: Option<u32>) -> Self {
        Self {
            model: None,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens,
        }
    }

    pub fn with_model(mut self, model: &'a str) -> Self {
        self.model = Some(model);
        self
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// 取第一个候选的文本
    pub fn into_text(self) -> Result<String, CompletionError> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| CompletionError::InvalidResponse("no choices in response".to_string()))
    }
}

/// OpenAI 客户端
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, CompletionError> {
        let client = build_client(config.timeout_secs)?;
        tracing::info!(model = %config.model, base_url = %config.base_url, "OpenAI client initialized");
        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionPort for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = ChatRequest::user(prompt, self.config.temperature, self.config.max_tokens)
            .with_model(&self.config.model);

        tracing::debug!(
            url = %self.completions_url(),
            prompt_len = prompt.len(),
            "Sending OpenAI completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error("OpenAI", e))?;

        read_json::<ChatResponse>(response).await?.into_text()
    }

    fn provider(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::llm::http::parse_json;

    #[test]
    fn test_request_body() {
        let request = ChatRequest::user("Translate me", 0.2, None).with_model("gpt-4o");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Translate me");
        assert!(json.get("max_tokens").is_none());

        let request = ChatRequest::user("x", 0.5, Some(1024));
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("model").is_none());
        assert_eq!(json["max_tokens"], 1024);
    }

    #[test]
    fn test_response_text() {
        let body = r#"{"id":"c1","choices":[{"index":0,"message":{"role":"assistant","content":"Cześć"}}]}"#;
        let response: ChatResponse = parse_json(body).unwrap();
        assert_eq!(response.into_text().unwrap(), "Cześć");
    }

    #[test]
    fn test_response_without_choices() {
        let response: ChatResponse = parse_json(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            response.into_text(),
            Err(CompletionError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_completions_url() {
        let client = OpenAiClient::new(OpenAiConfig {
            base_url: "https://api.openai.com/v1/".to_string(),
            ..OpenAiConfig::default()
        })
        .unwrap();
        assert_eq!(client.completions_url(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(client.provider(), "openai");
        assert_eq!(client.model(), "gpt-4o");
    }
}

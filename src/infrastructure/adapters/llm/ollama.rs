//! Ollama Client - 本地模型 /api/generate（非流式）

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{build_client, map_send_error, read_json};
use crate::application::ports::{CompletionError, CompletionPort};
use crate::config::OllamaConfig;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Ollama 客户端
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, CompletionError> {
        let client = build_client(config.timeout_secs)?;
        tracing::info!(model = %config.model, base_url = %config.base_url, "Ollama client initialized");
        Ok(Self { client, config })
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionPort for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
            },
        };

        tracing::debug!(
            url = %self.generate_url(),
            prompt_len = prompt.len(),
            "Sending Ollama generate request"
        );

        let response = self
            .client
            .post(self.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error("Ollama", e))?;

        Ok(read_json::<GenerateResponse>(response).await?.response)
    }

    fn provider(&self) -> &'static str {
        "ollama"
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
    fn test_request_is_not_streaming() {
        let request = GenerateRequest {
            model: "llama3.1",
            prompt: "hi",
            stream: false,
            options: GenerateOptions { temperature: 0.2 },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["model"], "llama3.1");
    }

    #[test]
    fn test_response_text() {
        let body = r#"{"model":"llama3.1","response":"Witaj","done":true}"#;
        let response: GenerateResponse = parse_json(body).unwrap();
        assert_eq!(response.response, "Witaj");
    }

    #[test]
    fn test_generate_url() {
        let client = OllamaClient::new(OllamaConfig {
            model: "mistral".to_string(),
            base_url: "http://gpu-box:11434/".to_string(),
            ..OllamaConfig::default()
        })
        .unwrap();
        assert_eq!(client.generate_url(), "http://gpu-box:11434/api/generate");
    }
}

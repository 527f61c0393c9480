//! Gemini Client - generateContent API
//!
//! POST {base_url}/models/{model}:generateContent?key={api_key}
//! Request: {"contents": [{"role": "user", "parts": [{"text": "..."}]}], "generationConfig": {...}}
//! Response: {"candidates": [{"content": {"parts": [{"text": "..."}]}}]}

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{build_client, map_send_error, read_json};
use crate::application::ports::{CompletionError, CompletionPort};
use crate::config::GeminiConfig;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// 拼接第一个候选的全部文本片段
    fn into_text(self) -> Result<String, CompletionError> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .map(|feedback| feedback.to_string())
                .unwrap_or_else(|| "no candidates in response".to_string());
            return Err(CompletionError::InvalidResponse(reason));
        };

        Ok(candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default())
    }
}

/// Gemini 客户端
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, CompletionError> {
        let client = build_client(config.timeout_secs)?;
        tracing::info!(model = %config.model, "Gemini client initialized");
        Ok(Self { client, config })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request<'a>(&self, prompt: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
                max_output_tokens: self.config.max_tokens,
            },
        }
    }
}

#[async_trait]
impl CompletionPort for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        tracing::debug!(
            url = %self.generate_url(),
            prompt_len = prompt.len(),
            "Sending Gemini generateContent request"
        );

        let response = self
            .client
            .post(self.generate_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&self.request(prompt))
            .send()
            .await
            .map_err(|e| map_send_error("Gemini", e))?;

        read_json::<GenerateResponse>(response).await?.into_text()
    }

    fn provider(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::llm::http::parse_json;

    fn client() -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: "key".to_string(),
            ..GeminiConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_request_body() {
        let client = client();
        let json = serde_json::to_value(client.request("Hallo")).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Hallo");
        assert_eq!(json["generationConfig"]["topK"], 64);
        assert!(json["generationConfig"].get("maxOutputTokens").is_none());
        assert_eq!(
            client.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_response_joins_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Dzień "},{"text":"dobry"}]},"finishReason":"STOP"}]}"#;
        let response: GenerateResponse = parse_json(body).unwrap();
        assert_eq!(response.into_text().unwrap(), "Dzień dobry");
    }

    #[test]
    fn test_blocked_prompt_is_invalid_response() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let response: GenerateResponse = parse_json(body).unwrap();
        let err = response.into_text().unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}

//! Azure OpenAI Client - 部署级 Chat Completions API
//!
//! POST {endpoint}/openai/deployments/{deployment}/chat/completions?api-version={version}
//! Header: api-key

use async_trait::async_trait;
use reqwest::Client;

use super::http::{build_client, map_send_error, read_json};
use super::openai::{ChatRequest, ChatResponse};
use crate::application::ports::{CompletionError, CompletionPort};
use crate::config::AzureConfig;

/// Azure OpenAI 客户端
pub struct AzureOpenAiClient {
    client: Client,
    config: AzureConfig,
}

impl AzureOpenAiClient {
    pub fn new(config: AzureConfig) -> Result<Self, CompletionError> {
        let client = build_client(config.timeout_secs)?;
        tracing::info!(
            deployment = %config.deployment_name,
            endpoint = %config.endpoint,
            "Azure OpenAI client initialized"
        );
        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment_name,
            self.config.api_version
        )
    }
}

#[async_trait]
impl CompletionPort for AzureOpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        // 模型由部署决定，请求体不带 model
        let request = ChatRequest::user(prompt, self.config.temperature, self.config.max_tokens);

        tracing::debug!(
            deployment = %self.config.deployment_name,
            prompt_len = prompt.len(),
            "Sending Azure OpenAI completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| map_send_error("Azure OpenAI", e))?;

        read_json::<ChatResponse>(response).await?.into_text()
    }

    fn provider(&self) -> &'static str {
        "azure"
    }

    fn model(&self) -> &str {
        &self.config.deployment_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_url() {
        let client = AzureOpenAiClient::new(AzureConfig {
            api_key: "key".to_string(),
            endpoint: "https://res.openai.azure.com/".to_string(),
            deployment_name: "gpt4o-prod".to_string(),
            ..AzureConfig::default()
        })
        .unwrap();

        assert_eq!(
            client.completions_url(),
            "https://res.openai.azure.com/openai/deployments/gpt4o-prod/chat/completions?api-version=2024-02-01"
        );
        assert_eq!(client.model(), "gpt4o-prod");
    }
}

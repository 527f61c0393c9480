//! LLM Client Factory - 按提供方构建补全客户端

use std::sync::Arc;

use super::{AzureOpenAiClient, GeminiClient, OllamaClient, OpenAiClient};
use crate::application::ports::{CompletionError, CompletionPort};
use crate::config::{validate_provider, AppConfig, ConfigError, LlmProvider};

/// 校验所选提供方配置并创建客户端
pub fn create_client(
    config: &AppConfig,
    provider: LlmProvider,
) -> Result<Arc<dyn CompletionPort>, ConfigError> {
    validate_provider(config, provider)?;

    let failed = |e: CompletionError| {
        ConfigError::ValidationError(format!("Failed to create {} client: {}", provider, e))
    };

    // validate_provider 已保证对应配置段存在
    let client: Arc<dyn CompletionPort> = match provider {
        LlmProvider::OpenAi => Arc::new(
            OpenAiClient::new(config.openai.clone().unwrap_or_default()).map_err(failed)?,
        ),
        LlmProvider::Azure => Arc::new(
            AzureOpenAiClient::new(config.azure.clone().unwrap_or_default()).map_err(failed)?,
        ),
        LlmProvider::Gemini => Arc::new(
            GeminiClient::new(config.gemini.clone().unwrap_or_default()).map_err(failed)?,
        ),
        LlmProvider::Ollama => Arc::new(
            OllamaClient::new(config.ollama.clone().unwrap_or_default()).map_err(failed)?,
        ),
    };

    tracing::info!(
        provider = client.provider(),
        model = client.model(),
        "Completion client created"
    );

    Ok(client)
}

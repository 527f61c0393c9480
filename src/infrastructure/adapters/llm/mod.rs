//! LLM Adapters
//!
//! CompletionPort 的具体实现：OpenAI、Azure OpenAI、Gemini、Ollama，以及测试用脚本客户端

mod azure;
mod factory;
mod fake;
mod gemini;
mod http;
mod ollama;
mod openai;

pub use azure::AzureOpenAiClient;
pub use factory::create_client;
pub use fake::{prompt_text, ScriptedCompletionClient};
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

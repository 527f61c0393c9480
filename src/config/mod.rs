//! Configuration Module
//!
//! 提供应用配置管理功能，支持多层级配置来源：
//! - 环境变量（最高优先级）
//! - 配置文件（TOML/YAML/JSON）
//! - 默认值（最低优先级）
//!
//! 命令行参数在加载完成后覆盖对应字段

mod loader;
mod types;

pub use loader::{
    load_config, load_config_from_path, print_config, validate_config, validate_provider,
    ConfigError,
};
pub use types::{
    AppConfig, AzureConfig, ChunkingConfig, GeminiConfig, LlmProvider, LogConfig, OllamaConfig,
    OpenAiConfig, OutputConfig, ProgressConfig, TranslationConfig,
};

//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（epub-translator.toml 或 config.toml，亦支持 YAML/JSON）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, AzureConfig, GeminiConfig, LlmProvider, OllamaConfig, OpenAiConfig};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径（扩展名自动识别）
const CONFIG_FILE_NAMES: &[&str] = &["epub-translator", "config"];

const OPENAI_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-4",
    "gpt-3.5-turbo",
    "gpt-3.5-turbo-16k",
];

const GEMINI_MODELS: &[&str] = &[
    "gemini-2.5-flash-preview-05-20",
    "gemini-1.5-flash",
    "gemini-1.5-flash-8b",
    "gemini-1.5-pro",
    "gemini-1.0-pro",
    "gemini-pro",
];

const OLLAMA_MODELS: &[&str] = &[
    "llama3.1",
    "llama3",
    "llama2",
    "mistral",
    "codellama",
    "phi",
    "gemma",
    "qwen",
];

const AZURE_API_VERSIONS: &[&str] = &[
    "2024-02-01",
    "2023-12-01-preview",
    "2023-10-01-preview",
    "2023-08-01-preview",
    "2023-06-01-preview",
    "2023-05-15",
];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `EPUB_TRANSLATOR_`，层级分隔符 `__`）
/// 2. 配置文件
/// 3. 默认值
///
/// # 环境变量示例
/// - `EPUB_TRANSLATOR_TRANSLATION__TO_LANG=DE`
/// - `EPUB_TRANSLATOR_CHUNKING__MAX_CHUNK_SIZE=8000`
/// - `EPUB_TRANSLATOR_OPENAI__API_KEY=sk-...`
/// - `EPUB_TRANSLATOR_OUTPUT__FORMATS=markdown,epub`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径（存在时必须可读），为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("translation.from_lang", "EN")?
        .set_default("translation.to_lang", "PL")?
        .set_default("translation.max_retries", 3)?
        .set_default("translation.retry_delay_secs", 180)?
        .set_default("translation.error_delay_secs", 5)?
        .set_default(
            "translation.extra_prompts",
            "Preserve paragraph breaks and formatting structure.",
        )?
        .set_default("translation.on_chapter_failure", "abort")?
        .set_default("chunking.max_chunk_size", 20000)?
        .set_default("chunking.overlap_size", 200)?
        .set_default("chunking.min_chunk_size", 1000)?
        .set_default("chunking.preserve_html", true)?
        .set_default("chunking.overlap_boundary_ratio", 0.5)?
        .set_default("progress.file", "data/progress.json")?
        .set_default("progress.auto_save", true)?
        .set_default("output.formats", vec!["markdown"])?
        .set_default("log.level", "info")?;

    // 2. 配置文件
    if let Some(path) = config_path {
        if !path.exists() {
            return Err(ConfigError::LoadError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: EPUB_TRANSLATOR_OPENAI__MODEL=gpt-4o-mini
    builder = builder.add_source(
        Environment::with_prefix("EPUB_TRANSLATOR")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("output.formats")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证通用配置
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let chunking = &config.chunking;

    if chunking.max_chunk_size == 0 || chunking.min_chunk_size == 0 {
        return Err(ConfigError::ValidationError(
            "Chunk sizes must be positive".to_string(),
        ));
    }

    if chunking.overlap_size >= chunking.max_chunk_size {
        return Err(ConfigError::ValidationError(format!(
            "Overlap size ({}) must be smaller than max chunk size ({})",
            chunking.overlap_size, chunking.max_chunk_size
        )));
    }

    if chunking.min_chunk_size > chunking.max_chunk_size {
        return Err(ConfigError::ValidationError(format!(
            "Min chunk size ({}) cannot exceed max chunk size ({})",
            chunking.min_chunk_size, chunking.max_chunk_size
        )));
    }

    if !(chunking.overlap_boundary_ratio > 0.0 && chunking.overlap_boundary_ratio < 1.0) {
        return Err(ConfigError::ValidationError(
            "Overlap boundary ratio must be between 0 and 1".to_string(),
        ));
    }

    if config.translation.max_retries == 0 {
        return Err(ConfigError::ValidationError(
            "Max retries must be at least 1".to_string(),
        ));
    }

    if config.progress.file.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Progress file path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 验证所选提供方的配置段
pub fn validate_provider(config: &AppConfig, provider: LlmProvider) -> Result<(), ConfigError> {
    let missing = || ConfigError::ValidationError(format!("Provider '{}' not configured", provider));

    match provider {
        LlmProvider::OpenAi => validate_openai(config.openai.as_ref().ok_or_else(missing)?),
        LlmProvider::Azure => validate_azure(config.azure.as_ref().ok_or_else(missing)?),
        LlmProvider::Gemini => validate_gemini(config.gemini.as_ref().ok_or_else(missing)?),
        LlmProvider::Ollama => validate_ollama(config.ollama.as_ref().ok_or_else(missing)?),
    }
}

fn validate_api_key(provider: &str, api_key: &str, placeholder: &str) -> Result<(), ConfigError> {
    if api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{} api_key is required",
            provider
        )));
    }
    if api_key == placeholder {
        return Err(ConfigError::ValidationError(format!(
            "Please set your actual {} API key",
            provider
        )));
    }
    Ok(())
}

fn warn_unknown(provider: &str, kind: &str, value: &str, known: &[&str]) {
    if !known.contains(&value) {
        tracing::warn!(
            provider = provider,
            value = value,
            known = ?known,
            "Unknown {}, continuing anyway",
            kind
        );
    }
}

fn validate_openai(config: &OpenAiConfig) -> Result<(), ConfigError> {
    validate_api_key("OpenAI", &config.api_key, "YOUR_OPENAI_API_KEY")?;
    warn_unknown("openai", "model", &config.model, OPENAI_MODELS);
    Ok(())
}

fn validate_azure(config: &AzureConfig) -> Result<(), ConfigError> {
    validate_api_key("Azure OpenAI", &config.api_key, "YOUR_AZURE_OPENAI_API_KEY")?;

    if config.endpoint.trim().is_empty()
        || config.endpoint == "https://your-resource-name.openai.azure.com/"
    {
        return Err(ConfigError::ValidationError(
            "Please set your actual Azure OpenAI endpoint".to_string(),
        ));
    }
    if !config.endpoint.starts_with("https://") {
        return Err(ConfigError::ValidationError(
            "Azure endpoint should start with 'https://'".to_string(),
        ));
    }
    if config.deployment_name.trim().is_empty() || config.deployment_name == "your-deployment-name" {
        return Err(ConfigError::ValidationError(
            "Please set your actual Azure OpenAI deployment_name".to_string(),
        ));
    }

    if !config.endpoint.contains("openai.azure.com") {
        tracing::warn!(
            endpoint = %config.endpoint,
            "Endpoint doesn't appear to be a standard Azure OpenAI endpoint"
        );
    }
    warn_unknown("azure", "API version", &config.api_version, AZURE_API_VERSIONS);
    Ok(())
}

fn validate_gemini(config: &GeminiConfig) -> Result<(), ConfigError> {
    validate_api_key("Gemini", &config.api_key, "YOUR_GEMINI_API_KEY")?;

    if !(0.0..=1.0).contains(&config.temperature) {
        return Err(ConfigError::ValidationError(
            "Gemini temperature must be between 0.0 and 1.0".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&config.top_p) {
        return Err(ConfigError::ValidationError(
            "Gemini top_p must be between 0.0 and 1.0".to_string(),
        ));
    }
    if config.top_k < 1 {
        return Err(ConfigError::ValidationError(
            "Gemini top_k must be a positive integer".to_string(),
        ));
    }

    warn_unknown("gemini", "model", &config.model, GEMINI_MODELS);
    Ok(())
}

fn validate_ollama(config: &OllamaConfig) -> Result<(), ConfigError> {
    if config.model.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Ollama model is required".to_string(),
        ));
    }
    if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
        return Err(ConfigError::ValidationError(
            "Ollama base_url must start with http:// or https://".to_string(),
        ));
    }

    // Ollama 模型名常带 tag（如 llama3.1:8b）
    let family = config.model.split(':').next().unwrap_or_default();
    warn_unknown("ollama", "model", family, OLLAMA_MODELS);
    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Translator Configuration ===");
    tracing::info!(
        "Languages: {} -> {}",
        config.translation.from_lang,
        config.translation.to_lang
    );
    tracing::info!("Max Retries: {}", config.translation.max_retries);
    tracing::info!(
        "Retry Delays: rate limit {}s, error {}s",
        config.translation.retry_delay_secs,
        config.translation.error_delay_secs
    );
    tracing::info!(
        "On Chapter Failure: {}",
        config.translation.on_chapter_failure
    );
    tracing::info!(
        "Chunking: max {} / overlap {} / min {}",
        config.chunking.max_chunk_size,
        config.chunking.overlap_size,
        config.chunking.min_chunk_size
    );
    tracing::info!("Progress File: {}", config.progress.file.display());
    tracing::info!("Output Formats: {}", config.output.formats.join(", "));
    if let Some(openai) = &config.openai {
        tracing::info!("OpenAI Model: {}", openai.model);
    }
    if let Some(azure) = &config.azure {
        tracing::info!("Azure Deployment: {}", azure.deployment_name);
    }
    if let Some(gemini) = &config.gemini {
        tracing::info!("Gemini Model: {}", gemini.model);
    }
    if let Some(ollama) = &config.ollama {
        tracing::info!("Ollama Model: {} at {}", ollama.model, ollama.base_url);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn toml_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_validation_passes_for_default_config() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_validation_error_for_overlap_not_below_max() {
        let mut config = AppConfig::default();
        config.chunking.max_chunk_size = 200;
        config.chunking.min_chunk_size = 100;
        config.chunking.overlap_size = 200;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_error_for_min_above_max() {
        let mut config = AppConfig::default();
        config.chunking.min_chunk_size = 30000;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_retries() {
        let mut config = AppConfig::default();
        config.translation.max_retries = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_ratio_out_of_range() {
        let mut config = AppConfig::default();
        config.chunking.overlap_boundary_ratio = 1.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_provider_section() {
        let config = AppConfig::default();
        let err = validate_provider(&config, LlmProvider::OpenAi).unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }

    #[test]
    fn test_placeholder_api_key_rejected() {
        let config = AppConfig {
            openai: Some(OpenAiConfig {
                api_key: "YOUR_OPENAI_API_KEY".to_string(),
                ..OpenAiConfig::default()
            }),
            ..AppConfig::default()
        };
        assert!(validate_provider(&config, LlmProvider::OpenAi).is_err());
    }

    #[test]
    fn test_azure_requires_https() {
        let config = AppConfig {
            azure: Some(AzureConfig {
                api_key: "key".to_string(),
                endpoint: "http://res.openai.azure.com/".to_string(),
                deployment_name: "gpt4".to_string(),
                ..AzureConfig::default()
            }),
            ..AppConfig::default()
        };
        assert!(validate_provider(&config, LlmProvider::Azure).is_err());
    }

    #[test]
    fn test_gemini_ranges() {
        let mut gemini = GeminiConfig {
            api_key: "key".to_string(),
            ..GeminiConfig::default()
        };
        let valid = AppConfig {
            gemini: Some(gemini.clone()),
            ..AppConfig::default()
        };
        assert!(validate_provider(&valid, LlmProvider::Gemini).is_ok());

        gemini.top_p = 1.5;
        let invalid = AppConfig {
            gemini: Some(gemini),
            ..AppConfig::default()
        };
        assert!(validate_provider(&invalid, LlmProvider::Gemini).is_err());
    }

    #[test]
    fn test_ollama_scheme_and_model() {
        let mut ollama = OllamaConfig {
            model: "llama3.1:8b".to_string(),
            ..OllamaConfig::default()
        };
        let config = AppConfig {
            ollama: Some(ollama.clone()),
            ..AppConfig::default()
        };
        assert!(validate_provider(&config, LlmProvider::Ollama).is_ok());

        ollama.base_url = "localhost:11434".to_string();
        let config = AppConfig {
            ollama: Some(ollama),
            ..AppConfig::default()
        };
        assert!(validate_provider(&config, LlmProvider::Ollama).is_err());
    }

    #[test]
    fn test_load_from_file_merges_defaults() {
        let file = toml_file(
            r#"
[translation]
to_lang = "DE"

[chunking]
max_chunk_size = 5000

[output]
formats = ["markdown", "epub"]

[openai]
api_key = "sk-test"
"#,
        );

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.translation.to_lang, "DE");
        assert_eq!(config.translation.from_lang, "EN");
        assert_eq!(config.chunking.max_chunk_size, 5000);
        assert_eq!(config.chunking.overlap_size, 200);
        assert_eq!(config.output.formats, vec!["markdown", "epub"]);

        let openai = config.openai.unwrap();
        assert_eq!(openai.api_key, "sk-test");
        assert_eq!(openai.model, "gpt-4o");
        assert!(config.azure.is_none());
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let file = toml_file("[chunking]\nmax_chunk_size = 100\noverlap_size = 100\nmin_chunk_size = 50\n");
        assert!(matches!(
            load_config_from_path(Some(file.path())),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = load_config_from_path(Some(Path::new("/nonexistent/translator.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}

//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::domain::ChunkConfig;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 翻译配置
    #[serde(default)]
    pub translation: TranslationConfig,

    /// 分块配置
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// 进度持久化配置
    #[serde(default)]
    pub progress: ProgressConfig,

    /// 输出配置
    #[serde(default)]
    pub output: OutputConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,

    /// 各 LLM 提供方配置，仅选中的一项需要存在
    #[serde(default)]
    pub openai: Option<OpenAiConfig>,

    #[serde(default)]
    pub azure: Option<AzureConfig>,

    #[serde(default)]
    pub gemini: Option<GeminiConfig>,

    #[serde(default)]
    pub ollama: Option<OllamaConfig>,
}

// ============================================================================
// Translation
// ============================================================================

/// 翻译配置
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "default_from_lang")]
    pub from_lang: String,

    #[serde(default = "default_to_lang")]
    pub to_lang: String,

    /// 每块最多尝试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// 限流后等待（秒）
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// 其他错误后等待（秒）
    #[serde(default = "default_error_delay_secs")]
    pub error_delay_secs: u64,

    #[serde(default = "default_extra_prompts")]
    pub extra_prompts: String,

    /// 自定义提示词模板，未设置时使用内置模板
    #[serde(default)]
    pub prompt_template: Option<String>,

    /// 章节失败策略：abort | placeholder
    #[serde(default = "default_on_chapter_failure")]
    pub on_chapter_failure: String,
}

fn default_from_lang() -> String {
    "EN".to_string()
}

fn default_to_lang() -> String {
    "PL".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    180
}

fn default_error_delay_secs() -> u64 {
    5
}

fn default_extra_prompts() -> String {
    "Preserve paragraph breaks and formatting structure.".to_string()
}

fn default_on_chapter_failure() -> String {
    "abort".to_string()
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            from_lang: default_from_lang(),
            to_lang: default_to_lang(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            error_delay_secs: default_error_delay_secs(),
            extra_prompts: default_extra_prompts(),
            prompt_template: None,
            on_chapter_failure: default_on_chapter_failure(),
        }
    }
}

// ============================================================================
// Chunking
// ============================================================================

/// 分块配置
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    #[serde(default = "default_overlap_size")]
    pub overlap_size: usize,

    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,

    #[serde(default = "default_preserve_html")]
    pub preserve_html: bool,

    /// 重叠边界搜索阈值（0 到 1 之间）
    #[serde(default = "default_overlap_boundary_ratio")]
    pub overlap_boundary_ratio: f64,
}

fn default_max_chunk_size() -> usize {
    crate::domain::chunker::DEFAULT_MAX_CHUNK_SIZE
}

fn default_overlap_size() -> usize {
    crate::domain::chunker::DEFAULT_OVERLAP_SIZE
}

fn default_min_chunk_size() -> usize {
    crate::domain::chunker::DEFAULT_MIN_CHUNK_SIZE
}

fn default_preserve_html() -> bool {
    true
}

fn default_overlap_boundary_ratio() -> f64 {
    crate::domain::chunker::DEFAULT_OVERLAP_BOUNDARY_RATIO
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            overlap_size: default_overlap_size(),
            min_chunk_size: default_min_chunk_size(),
            preserve_html: default_preserve_html(),
            overlap_boundary_ratio: default_overlap_boundary_ratio(),
        }
    }
}

impl ChunkingConfig {
    /// 转换为分块器配置
    pub fn to_chunk_config(&self) -> ChunkConfig {
        ChunkConfig {
            max_chunk_size: self.max_chunk_size,
            overlap_size: self.overlap_size,
            min_chunk_size: self.min_chunk_size,
            preserve_html: self.preserve_html,
            overlap_boundary_ratio: self.overlap_boundary_ratio,
        }
    }
}

// ============================================================================
// Progress / Output / Log
// ============================================================================

/// 进度持久化配置
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressConfig {
    /// 进度文件路径，章节缓存位于同目录的 `<stem>.chapters.json`
    #[serde(default = "default_progress_file")]
    pub file: PathBuf,

    #[serde(default = "default_auto_save")]
    pub auto_save: bool,
}

fn default_progress_file() -> PathBuf {
    PathBuf::from("data/progress.json")
}

fn default_auto_save() -> bool {
    true
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            file: default_progress_file(),
            auto_save: default_auto_save(),
        }
    }
}

/// 输出配置
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// 输出格式列表（markdown、epub）
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

fn default_formats() -> Vec<String> {
    vec!["markdown".to_string()]
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别（trace, debug, info, warn, error）
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================================================
// LLM providers
// ============================================================================

/// LLM 提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Azure,
    Gemini,
    Ollama,
}

impl LlmProvider {
    pub const ALL: [LlmProvider; 4] = [
        LlmProvider::OpenAi,
        LlmProvider::Azure,
        LlmProvider::Gemini,
        LlmProvider::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Azure => "azure",
            LlmProvider::Gemini => "gemini",
            LlmProvider::Ollama => "ollama",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        LlmProvider::ALL
            .into_iter()
            .find(|p| p.as_str() == name)
            .ok_or_else(|| {
                let available: Vec<&str> = LlmProvider::ALL.iter().map(|p| p.as_str()).collect();
                format!("Unknown provider '{}'. Available: {}", s, available.join(", "))
            })
    }
}

fn default_temperature() -> f32 {
    0.2
}

fn default_remote_timeout_secs() -> u64 {
    300
}

/// OpenAI 配置
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_openai_model")]
    pub model: String,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_openai_model(),
            base_url: default_openai_base_url(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_remote_timeout_secs(),
        }
    }
}

/// Azure OpenAI 配置
#[derive(Debug, Clone, Deserialize)]
pub struct AzureConfig {
    #[serde(default)]
    pub api_key: String,

    /// 形如 https://<resource>.openai.azure.com/
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub deployment_name: String,

    #[serde(default = "default_azure_api_version")]
    pub api_version: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_azure_api_version() -> String {
    "2024-02-01".to_string()
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: String::new(),
            deployment_name: String::new(),
            api_version: default_azure_api_version(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_remote_timeout_secs(),
        }
    }
}

/// Google Gemini 配置
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_remote_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_top_p() -> f32 {
    0.95
}

fn default_top_k() -> u32 {
    64
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            max_tokens: None,
            timeout_secs: default_remote_timeout_secs(),
        }
    }
}

/// Ollama 本地模型配置
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    #[serde(default)]
    pub model: String,

    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_ollama_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_timeout_secs() -> u64 {
    60
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            base_url: default_ollama_base_url(),
            temperature: default_temperature(),
            timeout_secs: default_ollama_timeout_secs(),
        }
    }
}

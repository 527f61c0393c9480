//! Renderer Port - 输出渲染端口
//!
//! 渲染器消费按章节编号排序的记录序列，写出一个产物文件

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::domain::ChapterRecord;

/// 渲染错误
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("EPUB generation error: {0}")]
    Epub(String),

    #[error("Unsupported output format: {0}")]
    Unsupported(String),
}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        RenderError::Io(err.to_string())
    }
}

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Markdown,
    Epub,
    Pdf,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Epub => "epub",
            OutputFormat::Pdf => "pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Epub => "epub",
            OutputFormat::Pdf => "pdf",
        }
    }

    /// 由输出基础路径推导产物路径（替换扩展名）
    pub fn output_path(&self, base: &Path) -> PathBuf {
        base.with_extension(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "epub" => Ok(OutputFormat::Epub),
            "pdf" => Ok(OutputFormat::Pdf),
            other => Err(RenderError::Unsupported(other.to_string())),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 渲染请求
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    /// 已按编号排序的章节记录
    pub records: &'a [ChapterRecord],
    pub from_lang: &'a str,
    pub to_lang: &'a str,
    /// 输出基础路径（扩展名由渲染器决定）
    pub output_base: &'a Path,
    /// 原书标题（若可知）
    pub book_title: Option<&'a str>,
}

/// Renderer Port
#[async_trait]
pub trait RendererPort: Send + Sync {
    fn format(&self) -> OutputFormat;

    /// 写出产物，返回文件路径
    async fn render(&self, request: &RenderRequest<'_>) -> Result<PathBuf, RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        assert_eq!("Markdown".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!(" epub ".parse::<OutputFormat>().unwrap(), OutputFormat::Epub);
        assert!(matches!(
            "docx".parse::<OutputFormat>(),
            Err(RenderError::Unsupported(f)) if f == "docx"
        ));
    }

    #[test]
    fn test_output_path_replaces_extension() {
        let base = Path::new("out/book.epub");
        assert_eq!(OutputFormat::Markdown.output_path(base), PathBuf::from("out/book.md"));
        assert_eq!(OutputFormat::Epub.output_path(Path::new("out/book")), PathBuf::from("out/book.epub"));
    }
}

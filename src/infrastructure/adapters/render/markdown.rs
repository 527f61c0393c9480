//! Markdown Renderer

use async_trait::async_trait;
use chrono::Local;
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::application::ports::{OutputFormat, RenderError, RenderRequest, RendererPort};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Markdown 渲染器
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// 生成 Markdown 文本，空章节不输出
pub(crate) fn render_markdown(
    request: &RenderRequest<'_>,
    generated_at: &str,
    completed_at: &str,
) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "# Translated Book ({} → {})\n\n*Translation generated on {}*\n\n---\n\n",
        request.from_lang, request.to_lang, generated_at
    );

    for record in request.records.iter().filter(|r| !r.is_empty()) {
        let _ = write!(out, "## {}\n\n{}\n\n---\n\n", record.title, record.content);
    }

    let _ = writeln!(out, "\n*Translation completed on {}*", completed_at);
    out
}

#[async_trait]
impl RendererPort for MarkdownRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }

    async fn render(&self, request: &RenderRequest<'_>) -> Result<PathBuf, RenderError> {
        let path = self.format().output_path(request.output_base);
        let now = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let content = render_markdown(request, &now, &now);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;

        tracing::info!(path = %path.display(), "Markdown saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChapterRecord;
    use std::path::Path;

    fn records() -> Vec<ChapterRecord> {
        vec![
            ChapterRecord::new(1, "Jeden", "Pierwszy akapit.\n\nDrugi akapit."),
            ChapterRecord::new(2, "Dwa", "   "),
            ChapterRecord::new(3, "Trzy", "Koniec."),
        ]
    }

    #[test]
    fn test_markdown_layout() {
        let records = records();
        let request = RenderRequest {
            records: &records,
            from_lang: "EN",
            to_lang: "PL",
            output_base: Path::new("out/book"),
            book_title: None,
        };

        let markdown = render_markdown(&request, "2024-01-01 10:00:00", "2024-01-01 11:00:00");
        let expected = "# Translated Book (EN → PL)\n\n\
            *Translation generated on 2024-01-01 10:00:00*\n\n---\n\n\
            ## Jeden\n\nPierwszy akapit.\n\nDrugi akapit.\n\n---\n\n\
            ## Trzy\n\nKoniec.\n\n---\n\n\
            \n*Translation completed on 2024-01-01 11:00:00*\n";
        assert_eq!(markdown, expected);
    }

    #[tokio::test]
    async fn test_render_writes_file_with_md_extension() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nested").join("book.epub");
        let records = records();
        let request = RenderRequest {
            records: &records,
            from_lang: "EN",
            to_lang: "PL",
            output_base: &base,
            book_title: Some("book"),
        };

        let path = MarkdownRenderer::new().render(&request).await.unwrap();
        assert_eq!(path, dir.path().join("nested").join("book.md"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# Translated Book (EN → PL)"));
        assert!(content.contains("## Trzy"));
        assert!(!content.contains("## Dwa"));
        assert!(content.trim_end().ends_with('*'));
    }
}

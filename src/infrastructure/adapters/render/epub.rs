//! EPUB Renderer - 基于 `epub-builder` 生成译本 EPUB
//!
//! 每个非空章节一个 `chapter_NNN.xhtml`，附内联目录

use async_trait::async_trait;
use epub_builder::{EpubBuilder, EpubContent, ReferenceType, ZipLibrary};
use std::path::PathBuf;

use crate::application::ports::{OutputFormat, RenderError, RenderRequest, RendererPort};
use crate::domain::ChapterRecord;

const DEFAULT_BOOK_TITLE: &str = "Translated Book";

/// EPUB 渲染器
#[derive(Debug, Clone, Copy, Default)]
pub struct EpubRenderer;

impl EpubRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn epub_error(err: impl std::fmt::Display) -> RenderError {
    RenderError::Epub(err.to_string())
}

/// 章节文件名
pub(crate) fn chapter_file_name(number: usize) -> String {
    format!("chapter_{:03}.xhtml", number)
}

/// 生成单章 XHTML，段落按空行切分并转义
pub(crate) fn chapter_xhtml(record: &ChapterRecord, lang: &str) -> String {
    let title = html_escape::encode_text(&record.title);
    let paragraphs: String = record
        .content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let escaped = html_escape::encode_text(p).replace('\n', "<br/>\n");
            format!("    <p>{}</p>\n", escaped)
        })
        .collect();

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE html>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\" xml:lang=\"{lang}\" lang=\"{lang}\">\n\
         <head>\n  <title>{title}</title>\n</head>\n\
         <body>\n  <h1>{title}</h1>\n{paragraphs}</body>\n</html>\n",
        lang = html_escape::encode_double_quoted_attribute(lang),
        title = title,
        paragraphs = paragraphs,
    )
}

/// 同步构建 EPUB 字节
fn build_epub(request: &RenderRequest<'_>) -> Result<Vec<u8>, RenderError> {
    let lang = request.to_lang.to_lowercase();
    let title = format!(
        "{} ({} → {})",
        request.book_title.unwrap_or(DEFAULT_BOOK_TITLE),
        request.from_lang,
        request.to_lang
    );

    let mut builder = EpubBuilder::new(ZipLibrary::new().map_err(epub_error)?).map_err(epub_error)?;
    builder.metadata("title", title).map_err(epub_error)?;
    builder.metadata("lang", lang.clone()).map_err(epub_error)?;
    builder
        .metadata("generator", env!("CARGO_PKG_NAME"))
        .map_err(epub_error)?;
    builder.inline_toc();

    for record in request.records.iter().filter(|r| !r.is_empty()) {
        let xhtml = chapter_xhtml(record, &lang);
        builder
            .add_content(
                EpubContent::new(chapter_file_name(record.number), xhtml.as_bytes())
                    .title(record.title.clone())
                    .reftype(ReferenceType::Text),
            )
            .map_err(epub_error)?;
    }

    let mut bytes = Vec::new();
    builder.generate(&mut bytes).map_err(epub_error)?;
    Ok(bytes)
}

#[async_trait]
impl RendererPort for EpubRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Epub
    }

    async fn render(&self, request: &RenderRequest<'_>) -> Result<PathBuf, RenderError> {
        let path = self.format().output_path(request.output_base);
        let bytes = build_epub(request)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;

        tracing::info!(path = %path.display(), size = bytes.len(), "EPUB saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }

    #[test]
    fn test_chapter_xhtml_escapes_and_splits() {
        let record = ChapterRecord::new(4, "Tom & Jerry", "First <para>.\n\nSecond\nline.");
        let xhtml = chapter_xhtml(&record, "pl");

        assert!(xhtml.contains("<title>Tom &amp; Jerry</title>"));
        assert!(xhtml.contains("<p>First &lt;para&gt;.</p>"));
        assert!(xhtml.contains("<p>Second<br/>\nline.</p>"));
        assert!(xhtml.contains("xml:lang=\"pl\""));
        assert_eq!(chapter_file_name(4), "chapter_004.xhtml");
    }

    #[tokio::test]
    async fn test_render_writes_epub_archive() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("book.md");
        let records = vec![
            ChapterRecord::new(1, "Jeden", "Tekst."),
            ChapterRecord::new(2, "Pusty", ""),
            ChapterRecord::new(12, "Dwanaście", "Więcej tekstu."),
        ];
        let request = RenderRequest {
            records: &records,
            from_lang: "EN",
            to_lang: "PL",
            output_base: &base,
            book_title: Some("book"),
        };

        let path = EpubRenderer::new().render(&request).await.unwrap();
        assert_eq!(path, dir.path().join("book.epub"));

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
        assert!(contains(&bytes, "chapter_001.xhtml"));
        assert!(contains(&bytes, "chapter_012.xhtml"));
        assert!(!contains(&bytes, "chapter_002.xhtml"));
    }
}

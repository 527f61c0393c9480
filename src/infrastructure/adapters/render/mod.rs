//! Render Adapters
//!
//! RendererPort 的实现：Markdown 与 EPUB

mod epub;
mod markdown;

pub use epub::EpubRenderer;
pub use markdown::MarkdownRenderer;

use std::sync::Arc;

use crate::application::ports::{OutputFormat, RenderError, RendererPort};

/// 按格式列表构建渲染器，重复项只保留一个
pub fn renderers_for(formats: &[OutputFormat]) -> Result<Vec<Arc<dyn RendererPort>>, RenderError> {
    let mut renderers: Vec<Arc<dyn RendererPort>> = Vec::new();

    for format in formats {
        if renderers.iter().any(|r| r.format() == *format) {
            continue;
        }
        let renderer: Arc<dyn RendererPort> = match format {
            OutputFormat::Markdown => Arc::new(MarkdownRenderer::new()),
            OutputFormat::Epub => Arc::new(EpubRenderer::new()),
            OutputFormat::Pdf => {
                return Err(RenderError::Unsupported(
                    "pdf (no PDF renderer available)".to_string(),
                ))
            }
        };
        renderers.push(renderer);
    }

    Ok(renderers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderers_deduplicated_in_order() {
        let renderers = renderers_for(&[
            OutputFormat::Epub,
            OutputFormat::Markdown,
            OutputFormat::Epub,
        ])
        .unwrap();
        let formats: Vec<OutputFormat> = renderers.iter().map(|r| r.format()).collect();
        assert_eq!(formats, vec![OutputFormat::Epub, OutputFormat::Markdown]);
    }

    #[test]
    fn test_pdf_is_unsupported() {
        assert!(matches!(
            renderers_for(&[OutputFormat::Markdown, OutputFormat::Pdf]),
            Err(RenderError::Unsupported(_))
        ));
    }
}

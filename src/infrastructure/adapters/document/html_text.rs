//! HTML Text Extractor - 从章节标记中提取可翻译的纯文本
//!
//! 块级元素边界与 `<br>` 变为段落分隔，段落以 `"\n\n"` 连接

use once_cell::sync::Lazy;
use regex::Regex;

use crate::application::ports::TextExtractorPort;

static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static regex"));
static SCRIPT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("static regex"));
static STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("static regex"));
static HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<head\b[^>]*>.*?</head\s*>").expect("static regex"));
static BLOCK_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)</?(?:p|div|h[1-6]|li|ul|ol|blockquote|section|article|header|footer|aside|table|tr|pre|figure|figcaption|dd|dt|hr)\b[^>]*>|<br\s*/?>",
    )
    .expect("static regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("static regex"));
static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("static regex"));

/// 基于正则的 HTML 文本提取器
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTextExtractor;

impl HtmlTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractorPort for HtmlTextExtractor {
    fn extract_text(&self, markup: &str) -> String {
        let text = COMMENT.replace_all(markup, "");
        let text = SCRIPT.replace_all(&text, "");
        let text = STYLE.replace_all(&text, "");
        // <head> 中的 <title> 只用于章节标题
        let text = HEAD.replace_all(&text, "");
        let text = BLOCK_BOUNDARY.replace_all(&text, "\n\n");
        let text = TAG.replace_all(&text, "");
        let text = html_escape::decode_html_entities(&text);

        BLANK_LINE
            .split(&text)
            .map(|paragraph| paragraph.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|paragraph| !paragraph.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(markup: &str) -> String {
        HtmlTextExtractor::new().extract_text(markup)
    }

    #[test]
    fn test_paragraphs_are_separated() {
        let markup = "<html><head><title>T</title><style>p { x: 1 }</style></head>\
                      <body><h1>Chapter One</h1><p>First   line\n of text.</p><p>Second.</p></body></html>";
        assert_eq!(extract(markup), "Chapter One\n\nFirst line of text.\n\nSecond.");
    }

    #[test]
    fn test_scripts_and_comments_removed() {
        let markup = "<p>Keep<!-- drop --> this.</p><script type=\"text/javascript\">var a = '<p>';</script>";
        assert_eq!(extract(markup), "Keep this.");
    }

    #[test]
    fn test_br_and_entities() {
        let markup = "<p>Tom &amp; Jerry<br/>&quot;Run!&quot;</p>";
        assert_eq!(extract(markup), "Tom & Jerry\n\n\"Run!\"");
    }

    #[test]
    fn test_inline_tags_stripped() {
        assert_eq!(extract("<p>An <em>important</em> <a href=\"#\">link</a>.</p>"), "An important link.");
    }

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(extract("Just text.\n\nAnother paragraph."), "Just text.\n\nAnother paragraph.");
        assert_eq!(extract("   "), "");
    }
}

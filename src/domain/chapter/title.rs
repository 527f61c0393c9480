//! Chapter Context - 标题提取

use once_cell::sync::Lazy;
use regex::Regex;

/// 标题长度上限（字符数，不含）
pub const MAX_TITLE_CHARS: usize = 100;

static HEADING_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(h1|h2|h3|title)(?:\s[^>]*)?>").expect("static regex"));
static ANY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("static regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// 提取章节标题
///
/// 取文档顺序中第一个 h1/h2/h3/title 元素的文本；
/// 为空或不短于 100 字符时退回 "Chapter N"
pub fn extract_title(markup: &str, chapter_number: usize) -> String {
    first_heading(markup)
        .filter(|title| !title.is_empty() && title.chars().count() < MAX_TITLE_CHARS)
        .unwrap_or_else(|| format!("Chapter {}", chapter_number))
}

fn first_heading(markup: &str) -> Option<String> {
    let caps = HEADING_OPEN.captures(markup)?;
    let open = caps.get(0)?;
    let name = caps.get(1)?.as_str().to_ascii_lowercase();

    // ASCII 小写不改变字节偏移
    let rest = &markup[open.end()..];
    let closing = format!("</{}", name);
    let end = rest.to_ascii_lowercase().find(&closing)?;

    let inner = ANY_TAG.replace_all(&rest[..end], " ");
    let decoded = html_escape::decode_html_entities(&inner);
    Some(WHITESPACE.replace_all(decoded.trim(), " ").into_owned())
}

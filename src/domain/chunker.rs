//! 文本分块器
//!
//! 将章节文本切分为适合 LLM 翻译的块：
//! 1. 按句子边界切分（`.` `!` `?` 后跟空白）
//! 2. HTML 模式下不在标签内部切分
//! 3. 累积句子直到接近 max_chunk_size，min_chunk_size 优先于 max_chunk_size
//! 4. 新块以上一块的重叠尾巴开头，保持上下文连续

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// 默认最大块字符数
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 20_000;
/// 默认重叠字符数
pub const DEFAULT_OVERLAP_SIZE: usize = 200;
/// 默认最小块字符数
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 1_000;
/// 重叠尾巴中句子边界必须位于该比例之后才会被采用
pub const DEFAULT_OVERLAP_BOUNDARY_RATIO: f64 = 0.5;

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("static regex"));
static OPEN_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^/>][^>]*>").expect("static regex"));
static CLOSE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</[^>]+>").expect("static regex"));

/// 分块配置
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// 单块最大字符数
    pub max_chunk_size: usize,
    /// 与上一块重叠的字符数
    pub overlap_size: usize,
    /// 单块最小字符数（与最大值冲突时优先）
    pub min_chunk_size: usize,
    /// 文本含 HTML 标签时是否按 HTML 感知方式切分
    pub preserve_html: bool,
    /// 重叠尾巴中句子边界的位置阈值（占 overlap_size 的比例）
    pub overlap_boundary_ratio: f64,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            overlap_size: DEFAULT_OVERLAP_SIZE,
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            preserve_html: true,
            overlap_boundary_ratio: DEFAULT_OVERLAP_BOUNDARY_RATIO,
        }
    }
}

/// 块元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMetadata {
    pub index: usize,
    pub character_count: usize,
    pub sentence_count: usize,
    pub has_html: bool,
    pub start_position: usize,
    pub end_position: usize,
}

/// 块校验告警（只报告，不报错）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkWarning {
    Oversized { index: usize, len: usize, max: usize },
    Undersized { index: usize, len: usize, min: usize },
    UnbalancedTags { index: usize, open: usize, close: usize },
}

impl fmt::Display for ChunkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkWarning::Oversized { index, len, max } => {
                write!(f, "Chunk {} exceeds maximum size: {} > {}", index + 1, len, max)
            }
            ChunkWarning::Undersized { index, len, min } => {
                write!(f, "Chunk {} is below minimum size: {} < {}", index + 1, len, min)
            }
            ChunkWarning::UnbalancedTags { index, open, close } => write!(
                f,
                "Chunk {} may have unbalanced HTML tags ({} open, {} close)",
                index + 1,
                open,
                close
            ),
        }
    }
}

/// 句子及其前导分隔符（规范化后的空白）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sentence<'a> {
    text: &'a str,
    separator: &'static str,
}

/// 检查是否为句末标点
#[inline]
fn is_terminal(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

#[inline]
fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 检查文本是否包含 HTML 标签
pub fn has_html(text: &str) -> bool {
    HTML_TAG.is_match(text)
}

/// 空行保留为段落分隔，单换行保留为换行，其余折叠为空格
fn normalize_separator(whitespace: &str) -> &'static str {
    match whitespace.matches('\n').count() {
        0 => " ",
        1 => "\n",
        _ => "\n\n",
    }
}

/// 按句末标点 + 空白切分句子
///
/// `html_aware` 为 true 时，位于标签内部（`<` 与 `>` 之间）的标点不构成边界
fn split_sentences(text: &str, html_aware: bool) -> Vec<Sentence<'_>> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut separator = " ";
    let mut in_tag = false;
    let mut iter = text.char_indices().peekable();

    while let Some((_, ch)) = iter.next() {
        if html_aware {
            match ch {
                '<' => in_tag = true,
                '>' => in_tag = false,
                _ => {}
            }
        }

        if !is_terminal(ch) || in_tag {
            continue;
        }

        let ws_start = match iter.peek() {
            Some(&(idx, next)) if next.is_whitespace() => idx,
            _ => continue,
        };
        let mut ws_end = ws_start;
        while let Some(&(idx, next)) = iter.peek() {
            if !next.is_whitespace() {
                break;
            }
            ws_end = idx + next.len_utf8();
            iter.next();
        }

        let sentence = text[start..ws_start].trim();
        if !sentence.is_empty() {
            sentences.push(Sentence {
                text: sentence,
                separator,
            });
        }
        separator = normalize_separator(&text[ws_start..ws_end]);
        start = ws_end;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(Sentence {
            text: rest,
            separator,
        });
    }

    sentences
}

/// 起点位于标签内部时返回该标签结束后的位置；标签未闭合返回 None
fn skip_partial_tag(text: &str, start: usize) -> Option<usize> {
    let before = &text[..start];
    let inside = match (before.rfind('<'), before.rfind('>')) {
        (Some(open), Some(close)) => open > close,
        (Some(_), None) => true,
        _ => false,
    };
    if !inside {
        return Some(start);
    }
    text[start..].find('>').map(|pos| start + pos + 1)
}

/// 统计句子数
fn count_sentences(text: &str) -> usize {
    text.split(is_terminal)
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// 文本分块器
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// 将文本切分为有序块
    ///
    /// 空文本或纯空白文本返回空序列
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            tracing::debug!("Input text is empty or whitespace only");
            return Vec::new();
        }

        let html_mode = self.config.preserve_html && has_html(text);
        let sentences = split_sentences(text, html_mode);
        let chunks = self.accumulate(&sentences, html_mode);
        let chunks = self.clean_chunks(chunks);

        tracing::debug!(
            text_len = char_len(text),
            sentences = sentences.len(),
            chunks = chunks.len(),
            html_mode = html_mode,
            "Text split into chunks"
        );

        chunks
    }

    /// 切分并附带元数据
    pub fn split_with_metadata(&self, text: &str) -> Vec<(String, ChunkMetadata)> {
        let mut position = 0;

        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                let character_count = char_len(&chunk);
                let metadata = ChunkMetadata {
                    index,
                    character_count,
                    sentence_count: count_sentences(&chunk),
                    has_html: has_html(&chunk),
                    start_position: position,
                    end_position: position + character_count,
                };
                position += character_count.saturating_sub(self.config.overlap_size);
                (chunk, metadata)
            })
            .collect()
    }

    /// 估算块数量（仅用于预估，真实数量以 split 为准）
    pub fn estimate_chunks(&self, text: &str) -> usize {
        if text.trim().is_empty() {
            return 0;
        }

        let text_len = char_len(text);
        if text_len <= self.config.max_chunk_size {
            return 1;
        }

        let effective = self
            .config
            .max_chunk_size
            .saturating_sub(self.config.overlap_size)
            .max(1);
        text_len.div_ceil(effective).max(1)
    }

    /// 校验块，返回告警列表
    pub fn validate(&self, chunks: &[String]) -> Vec<ChunkWarning> {
        let mut warnings = Vec::new();

        for (index, chunk) in chunks.iter().enumerate() {
            let len = char_len(chunk);
            if len > self.config.max_chunk_size {
                warnings.push(ChunkWarning::Oversized {
                    index,
                    len,
                    max: self.config.max_chunk_size,
                });
            }
            if len < self.config.min_chunk_size {
                warnings.push(ChunkWarning::Undersized {
                    index,
                    len,
                    min: self.config.min_chunk_size,
                });
            }
            if self.config.preserve_html && has_html(chunk) {
                let open = OPEN_TAG.find_iter(chunk).count();
                let close = CLOSE_TAG.find_iter(chunk).count();
                if open != close {
                    warnings.push(ChunkWarning::UnbalancedTags { index, open, close });
                }
            }
        }

        warnings
    }

    /// 累积句子成块
    fn accumulate(&self, sentences: &[Sentence<'_>], html_mode: bool) -> Vec<String> {
        let max = self.config.max_chunk_size;
        let min = self.config.min_chunk_size;

        let mut chunks = Vec::new();
        let mut buffer = String::new();
        let mut buffer_len = 0;

        for sentence in sentences {
            let sentence_len = char_len(sentence.text) + self.terminal_reserve(sentence.text, html_mode);

            if buffer.is_empty() {
                buffer.push_str(sentence.text);
                buffer_len = char_len(sentence.text);
                continue;
            }

            let separator_len = char_len(sentence.separator);
            let projected = buffer_len + separator_len + sentence_len;

            // 低于 min_chunk_size 时继续累积，即使超过 max_chunk_size
            if projected > max && buffer_len >= min {
                let finished = std::mem::take(&mut buffer);
                let overlap = self.overlap_tail(&finished, html_mode);
                let overlap_len = char_len(&overlap);
                chunks.push(finished);

                // 重叠尾巴会让新块超限时放弃重叠
                if !overlap.is_empty() && overlap_len + 1 + sentence_len <= max {
                    buffer = overlap;
                    buffer.push(' ');
                    buffer_len = overlap_len + 1;
                } else {
                    buffer_len = 0;
                }
                buffer.push_str(sentence.text);
                buffer_len += char_len(sentence.text);
                continue;
            }

            buffer.push_str(sentence.separator);
            buffer.push_str(sentence.text);
            buffer_len += separator_len + char_len(sentence.text);
        }

        if !buffer.trim().is_empty() {
            chunks.push(buffer);
        }

        chunks
    }

    /// 纯文本句子缺少句末标点时，后处理会补一个 `.`
    fn terminal_reserve(&self, sentence: &str, html_mode: bool) -> usize {
        if html_mode || sentence.ends_with(is_terminal) {
            0
        } else {
            1
        }
    }

    /// 取块尾部的重叠文本
    ///
    /// 尾部中存在位于阈值之后的句子边界时，从该边界之后开始；否则直接使用原始尾部。
    /// HTML 模式下起点落在标签内部时跳到该标签结束之后
    fn overlap_tail(&self, chunk: &str, html_mode: bool) -> String {
        let overlap = self.config.overlap_size;
        if overlap == 0 {
            return String::new();
        }

        let total = char_len(chunk);
        if total <= overlap {
            return chunk.to_string();
        }

        let mut start = chunk
            .char_indices()
            .nth(total - overlap)
            .map(|(idx, _)| idx)
            .unwrap_or(0);

        if let Some(boundary) = self.tail_boundary(&chunk[start..], overlap) {
            start += boundary;
        }

        if html_mode {
            match skip_partial_tag(chunk, start) {
                Some(adjusted) => start = adjusted,
                None => return String::new(),
            }
        }

        chunk[start..].trim_start().to_string()
    }

    /// 尾部中阈值之后最后一个句子边界（返回边界后的字节偏移）
    fn tail_boundary(&self, candidate: &str, overlap: usize) -> Option<usize> {
        let threshold = (overlap as f64 * self.config.overlap_boundary_ratio) as usize;
        let (char_pos, ((byte_pos, ch), _)) = candidate
            .char_indices()
            .zip(candidate.chars().skip(1))
            .enumerate()
            .filter(|(_, ((_, ch), next))| is_terminal(*ch) && next.is_whitespace())
            .last()?;

        let offset = byte_pos + ch.len_utf8();
        if char_pos > threshold && !candidate[offset..].trim().is_empty() {
            Some(offset)
        } else {
            None
        }
    }

    /// 清理块：去除首尾空白，纯文本块补齐句末标点
    fn clean_chunks(&self, chunks: Vec<String>) -> Vec<String> {
        chunks
            .into_iter()
            .filter_map(|chunk| {
                let chunk = chunk.trim();
                if chunk.is_empty() {
                    return None;
                }
                if self.config.preserve_html && has_html(chunk) {
                    return Some(chunk.to_string());
                }
                let mut chunk = chunk.to_string();
                if !chunk.ends_with(is_terminal) {
                    chunk.push('.');
                }
                Some(chunk)
            })
            .collect()
    }
}

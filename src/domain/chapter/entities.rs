//! Chapter Context - Entities

use serde::{Deserialize, Serialize};

/// 文档中的一个章节（如 EPUB spine 项）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterSource {
    /// 文档内标识（spine idref）
    pub id: String,
    /// HTML/XHTML 标记或纯文本
    pub markup: String,
}

impl ChapterSource {
    pub fn new(id: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            markup: markup.into(),
        }
    }
}

/// 翻译完成的章节记录
///
/// 按编号排序后的记录序列是渲染器的唯一输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    pub number: usize,
    pub title: String,
    pub content: String,
}

impl ChapterRecord {
    pub fn new(number: usize, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            content: content.into(),
        }
    }

    /// 翻译失败的占位记录
    pub fn placeholder(number: usize, title: impl Into<String>, error: &str) -> Self {
        Self::new(number, title, format!("[Translation failed: {}]", error))
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// 按章节编号排序
pub fn sort_records(records: &mut [ChapterRecord]) {
    records.sort_by_key(|r| r.number);
}

/// 插入或整体替换同编号的记录，并保持有序
pub fn upsert_record(records: &mut Vec<ChapterRecord>, record: ChapterRecord) {
    match records.iter_mut().find(|r| r.number == record.number) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
    sort_records(records);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_replaces_and_sorts() {
        let mut records = vec![ChapterRecord::new(3, "c", "three")];
        upsert_record(&mut records, ChapterRecord::new(1, "a", "one"));
        upsert_record(&mut records, ChapterRecord::new(3, "c", "three again"));

        let numbers: Vec<usize> = records.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert_eq!(records[1].content, "three again");
    }

    #[test]
    fn test_placeholder_content() {
        let record = ChapterRecord::placeholder(2, "Chapter 2", "boom");
        assert_eq!(record.content, "[Translation failed: boom]");
        assert!(!record.is_empty());
        assert!(ChapterRecord::new(1, "t", "  \n").is_empty());
    }
}

//! Translate Commands

use std::path::PathBuf;
use std::str::FromStr;

/// 章节翻译失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChapterFailurePolicy {
    /// 中止整个作业（保留进度以便恢复）
    #[default]
    Abort,
    /// 插入占位记录并继续下一章（该章下次运行重试）
    Placeholder,
}

impl ChapterFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChapterFailurePolicy::Abort => "abort",
            ChapterFailurePolicy::Placeholder => "placeholder",
        }
    }
}

impl FromStr for ChapterFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(ChapterFailurePolicy::Abort),
            "placeholder" | "continue" => Ok(ChapterFailurePolicy::Placeholder),
            other => Err(format!(
                "unknown chapter failure policy '{}', expected 'abort' or 'placeholder'",
                other
            )),
        }
    }
}

/// 翻译整本书命令
#[derive(Debug, Clone)]
pub struct TranslateBook {
    /// 起始章节（1 起）
    pub from_chapter: usize,
    /// 结束章节（含）
    pub to_chapter: usize,
    pub from_lang: String,
    pub to_lang: String,
    /// 输出基础路径，各格式替换扩展名
    pub output_base: PathBuf,
}

impl TranslateBook {
    pub fn new(
        from_lang: impl Into<String>,
        to_lang: impl Into<String>,
        output_base: impl Into<PathBuf>,
    ) -> Self {
        Self {
            from_chapter: 1,
            to_chapter: usize::MAX,
            from_lang: from_lang.into(),
            to_lang: to_lang.into(),
            output_base: output_base.into(),
        }
    }

    pub fn with_range(mut self, from_chapter: usize, to_chapter: usize) -> Self {
        self.from_chapter = from_chapter;
        self.to_chapter = to_chapter;
        self
    }
}

/// 翻译整本书响应
#[derive(Debug, Clone, Default)]
pub struct TranslateBookResponse {
    /// 本次翻译完成的章节数
    pub translated: usize,
    /// 已完成而跳过的章节数
    pub skipped: usize,
    /// 以占位记录代替的失败章节
    pub failed: Vec<usize>,
    /// 写出的产物
    pub outputs: Vec<PathBuf>,
}

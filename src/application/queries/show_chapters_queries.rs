//! Show Chapters Queries

/// 列出书中章节查询
#[derive(Debug, Clone)]
pub struct ShowChapters {
    /// 附带预览、精确分块数与分块告警
    pub detailed: bool,
    /// 报告标签
    pub model: String,
    pub from_lang: String,
    pub to_lang: Option<String>,
}

impl ShowChapters {
    pub fn new(model: impl Into<String>, from_lang: impl Into<String>) -> Self {
        Self {
            detailed: false,
            model: model.into(),
            from_lang: from_lang.into(),
            to_lang: None,
        }
    }

    pub fn detailed(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }

    pub fn with_to_lang(mut self, to_lang: impl Into<String>) -> Self {
        self.to_lang = Some(to_lang.into());
        self
    }
}

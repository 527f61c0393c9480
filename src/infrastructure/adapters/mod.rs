//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod document;
pub mod llm;
pub mod render;

pub use document::{EpubDocument, HtmlTextExtractor};
pub use llm::{create_client, ScriptedCompletionClient};
pub use render::{renderers_for, EpubRenderer, MarkdownRenderer};

//! Document Adapters
//!
//! DocumentPort 与 TextExtractorPort 的实现

mod epub_reader;
mod html_text;

pub use epub_reader::EpubDocument;
pub use html_text::HtmlTextExtractor;

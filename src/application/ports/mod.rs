//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod completion;
mod document;
mod renderer;
mod storage;

pub use completion::{CompletionError, CompletionPort};
pub use document::{DocumentError, DocumentPort, TextExtractorPort};
pub use renderer::{OutputFormat, RenderError, RenderRequest, RendererPort};
pub use storage::{ChapterStorePort, ProgressStorePort, StoreError};

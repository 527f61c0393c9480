//! JSON File Persistence - 进度文件与章节缓存
//!
//! 两个文件均整体覆盖写入：先写同目录临时文件再 rename

mod chapter_store;
mod progress_store;

pub use chapter_store::JsonChapterStore;
pub use progress_store::JsonProgressStore;

use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::StoreError;

/// 由进度文件路径推导章节缓存路径
///
/// `data/progress.json` -> `data/progress.chapters.json`
pub fn chapter_cache_path(progress_file: &Path) -> PathBuf {
    progress_file.with_extension("chapters.json")
}

/// 原子写入 JSON（临时文件 + rename）
pub(crate) async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(value)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, &json).await?;
    fs::rename(&tmp_path, path).await?;
    Ok(())
}

/// 读取文件内容，不存在时返回 None
pub(crate) async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;

use crate::error::{Result, TodoAppError};

/// Reads the whole file. `None` means the file does not exist.
pub(crate) async fn read_all(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(TodoAppError::Storage(format!(
            "failed to read {}: {e}",
            path.display()
        ))),
    }
}

/// Replaces the file with the pretty-printed JSON form of `value`.
///
/// The content goes to a temporary sibling first and is renamed over the
/// target, so readers never observe a half-written file.
pub(crate) async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path).await?;
    let content =
        serde_json::to_vec_pretty(value).map_err(|e| TodoAppError::Serialization(e.to_string()))?;

    let tmp = temp_path(path);
    fs::write(&tmp, &content).await.map_err(|e| {
        TodoAppError::Storage(format!("failed to write {}: {e}", tmp.display()))
    })?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(TodoAppError::Storage(format!(
            "failed to replace {}: {e}",
            path.display()
        )));
    }
    Ok(())
}

async fn ensure_parent_dir(path: &Path) -> Result<()> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    fs::create_dir_all(parent).await.map_err(|e| {
        TodoAppError::Storage(format!("failed to create {}: {e}", parent.display()))
    })
}

pub(crate) fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn temp_path(path: &Path) -> PathBuf {
    with_suffix(path, ".tmp")
}

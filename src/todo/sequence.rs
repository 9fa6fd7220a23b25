use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::backing;
use super::TodoItem;
use crate::error::{Result, TodoAppError};

#[derive(Debug, Serialize, Deserialize)]
struct SequenceFile {
    next_id: i64,
}

/// Id counter stored next to the backing file, so ids of deleted items are
/// never handed out again.
#[derive(Debug, Clone)]
pub struct IdSequence {
    path: PathBuf,
}

impl IdSequence {
    pub fn for_backing_file(backing_file: &Path) -> Self {
        Self {
            path: backing::with_suffix(backing_file, ".seq"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored next id, or `None` when the sidecar is missing or unreadable.
    pub async fn peek(&self) -> Result<Option<i64>> {
        let Some(bytes) = backing::read_all(&self.path).await? else {
            return Ok(None);
        };
        match serde_json::from_slice::<SequenceFile>(&bytes) {
            Ok(file) => Ok(Some(file.next_id)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "id sequence unreadable, deriving next id from items"
                );
                Ok(None)
            }
        }
    }

    pub async fn advance_past(&self, id: i64) -> Result<()> {
        let file = SequenceFile {
            next_id: after(id)?,
        };
        backing::write_json(&self.path, &file).await
    }
}

pub fn next_id(stored: Option<i64>, items: &[TodoItem]) -> Result<i64> {
    let after_existing = match items.iter().map(|item| item.id).max() {
        Some(max) => after(max)?,
        None => 1,
    };
    Ok(stored.map_or(after_existing, |s| s.max(after_existing)).max(1))
}

fn after(id: i64) -> Result<i64> {
    id.checked_add(1)
        .ok_or_else(|| TodoAppError::Storage(format!("todo ids exhausted after {id}")))
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::error::{Result, TodoAppError};

mod backing;
mod sequence;

pub use sequence::{next_id, IdSequence};

pub const INVALID_TEXT_MESSAGE: &str = "Please enter a valid todo item!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: i64,
    pub text: String,
    pub completed: bool,
    #[serde(default)]
    pub created_at: String,
}

/// What a read of the backing file produced.
///
/// `Missing` and `Corrupt` both mean "no data": an unreadable store is
/// treated as an empty collection, and the next write replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Missing,
    Corrupt,
    Loaded(Vec<TodoItem>),
}

impl Snapshot {
    pub fn decode(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<Vec<TodoItem>>(bytes) {
            Ok(items) => Self::Loaded(items),
            Err(_) => Self::Corrupt,
        }
    }

    pub fn into_items(self) -> Vec<TodoItem> {
        match self {
            Self::Loaded(items) => items,
            Self::Missing | Self::Corrupt => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TodoStats {
    pub completed: usize,
    pub total: usize,
}

impl TodoStats {
    pub fn from_items(items: &[TodoItem]) -> Self {
        Self {
            completed: items.iter().filter(|item| item.completed).count(),
            total: items.len(),
        }
    }
}

/// Trims `raw` and rejects it when nothing is left.
pub fn validate_text(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TodoAppError::Validation(INVALID_TEXT_MESSAGE.to_string()));
    }
    Ok(trimmed)
}

/// Todo list persisted as one JSON array.
///
/// Every operation reads the whole backing file, transforms the list in
/// memory and writes the whole list back. Nothing is cached between calls.
/// The internal lock serializes those cycles inside one process only.
pub struct TodoStore {
    path: PathBuf,
    sequence: IdSequence,
    lock: Mutex<()>,
}

impl TodoStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let sequence = IdSequence::for_backing_file(&path);
        Self {
            path,
            sequence,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Snapshot> {
        let Some(bytes) = backing::read_all(&self.path).await? else {
            tracing::debug!(path = %self.path.display(), "backing file missing");
            return Ok(Snapshot::Missing);
        };
        let snapshot = Snapshot::decode(&bytes);
        if snapshot == Snapshot::Corrupt {
            tracing::warn!(
                path = %self.path.display(),
                "backing file is not a valid todo list, treating it as empty"
            );
        }
        Ok(snapshot)
    }

    pub async fn list(&self) -> Result<Vec<TodoItem>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_items())
    }

    pub async fn stats(&self) -> Result<TodoStats> {
        let items = self.list().await?;
        Ok(TodoStats::from_items(&items))
    }

    pub async fn add(&self, text: &str) -> Result<TodoItem> {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await?.into_items();
        let stored = self.sequence.peek().await?;
        let item = TodoItem {
            id: next_id(stored, &items)?,
            text: text.to_string(),
            completed: false,
            created_at: now_rfc3339()?,
        };
        items.push(item.clone());
        self.save(&items).await?;
        // The list is committed; a stale sidecar is recovered by `next_id`.
        if let Err(e) = self.sequence.advance_past(item.id).await {
            tracing::warn!(
                path = %self.sequence.path().display(),
                error = %e,
                "failed to advance id sequence"
            );
        }
        tracing::info!(id = item.id, total = items.len(), "todo added");
        Ok(item)
    }

    /// Flips `completed` on the first item with `id`. Unknown ids are a
    /// no-op; the list is written back either way.
    pub async fn toggle(&self, id: i64) -> Result<Option<TodoItem>> {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await?.into_items();
        let toggled = items.iter_mut().find(|item| item.id == id).map(|item| {
            item.completed = !item.completed;
            item.clone()
        });
        self.save(&items).await?;
        match &toggled {
            Some(item) => tracing::info!(id, completed = item.completed, "todo toggled"),
            None => tracing::debug!(id, "toggle matched no todo"),
        }
        Ok(toggled)
    }

    /// Removes every item with `id`. Returns whether anything was removed.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut items = self.load().await?.into_items();
        let before = items.len();
        items.retain(|item| item.id != id);
        let removed = before - items.len();
        self.save(&items).await?;
        if removed > 0 {
            tracing::info!(id, removed, "todo deleted");
        } else {
            tracing::debug!(id, "delete matched no todo");
        }
        Ok(removed > 0)
    }

    async fn save(&self, items: &[TodoItem]) -> Result<()> {
        backing::write_json(&self.path, items).await
    }
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| TodoAppError::Runtime(e.to_string()))
}

pub mod config;
pub mod daemon;
pub mod error;
pub mod todo;
pub mod ui;

pub use crate::config::Config;
pub use crate::error::{Result, TodoAppError};
pub use crate::todo::{Snapshot, TodoItem, TodoStats, TodoStore};

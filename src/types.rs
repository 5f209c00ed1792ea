//! Core record types returned by the task store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A top-level to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Stored file name inside the upload directory.
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A child item owned by exactly one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: i64,
    pub task_id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A task together with its subtasks (oldest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskWithSubtasks {
    #[serde(flatten)]
    pub task: Task,
    pub subtasks: Vec<Subtask>,
}

impl TaskWithSubtasks {
    pub fn completed_subtasks(&self) -> usize {
        self.subtasks.iter().filter(|s| s.completed).count()
    }
}

/// Outcome of a cascading task delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedTask {
    pub id: i64,
    pub subtasks_removed: usize,
    /// Image the caller should discard now that the row is gone.
    pub image_path: Option<String>,
}

/// Row counts for the index header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub total: i64,
    pub completed: i64,
    pub subtasks: i64,
}

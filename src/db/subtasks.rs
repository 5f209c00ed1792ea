//! Subtask operations, scoped to an owning task.

use super::tasks::get_task_internal;
use super::{Database, optional_timestamp_column, require_title, timestamp_column};
use crate::error::{AppError, AppResult};
use crate::types::Subtask;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

const SUBTASK_COLUMNS: &str = "id, task_id, title, created_at, completed, completed_at";

pub fn parse_subtask_row(row: &Row) -> rusqlite::Result<Subtask> {
    Ok(Subtask {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        title: row.get("title")?,
        created_at: timestamp_column(row, "created_at")?,
        completed: row.get("completed")?,
        completed_at: optional_timestamp_column(row, "completed_at")?,
    })
}

fn get_subtask_internal(conn: &Connection, subtask_id: i64) -> AppResult<Subtask> {
    conn.query_row(
        &format!("SELECT {SUBTASK_COLUMNS} FROM subtasks WHERE id = ?1"),
        params![subtask_id],
        parse_subtask_row,
    )
    .optional()?
    .ok_or_else(|| AppError::subtask_not_found(subtask_id))
}

/// Subtasks of a task, oldest first. Does not check that the task exists.
pub(crate) fn list_subtasks_internal(conn: &Connection, task_id: i64) -> AppResult<Vec<Subtask>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {SUBTASK_COLUMNS} FROM subtasks WHERE task_id = ?1 ORDER BY created_at, id"
    ))?;
    let subtasks = stmt
        .query_map(params![task_id], parse_subtask_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(subtasks)
}

impl Database {
    /// Add a subtask to an existing task.
    pub fn create_subtask(&self, task_id: i64, title: &str) -> AppResult<Subtask> {
        self.create_subtask_at(task_id, title, Utc::now())
    }

    /// Add a subtask with an explicit creation time.
    pub fn create_subtask_at(
        &self,
        task_id: i64,
        title: &str,
        created_at: DateTime<Utc>,
    ) -> AppResult<Subtask> {
        let title = require_title(title)?;

        let subtask = self.with_conn(|conn| {
            get_task_internal(conn, task_id)?;
            conn.execute(
                "INSERT INTO subtasks (task_id, title, created_at, completed)
                 VALUES (?1, ?2, ?3, 0)",
                params![task_id, title, created_at.timestamp_millis()],
            )?;
            get_subtask_internal(conn, conn.last_insert_rowid())
        })?;

        info!(task_id, subtask_id = subtask.id, "Subtask created");
        Ok(subtask)
    }

    /// Get a subtask by id.
    pub fn get_subtask(&self, subtask_id: i64) -> AppResult<Subtask> {
        self.with_conn(|conn| get_subtask_internal(conn, subtask_id))
    }

    /// List the subtasks of a task, oldest first.
    pub fn list_subtasks(&self, task_id: i64) -> AppResult<Vec<Subtask>> {
        self.with_conn(|conn| {
            get_task_internal(conn, task_id)?;
            list_subtasks_internal(conn, task_id)
        })
    }

    /// Set or clear subtask completion, stamping the current time on a false->true transition.
    pub fn set_subtask_completion(&self, subtask_id: i64, completed: bool) -> AppResult<Subtask> {
        self.set_subtask_completion_at(subtask_id, completed, Utc::now())
    }

    /// Set or clear subtask completion with an explicit completion time.
    pub fn set_subtask_completion_at(
        &self,
        subtask_id: i64,
        completed: bool,
        at: DateTime<Utc>,
    ) -> AppResult<Subtask> {
        let subtask = self.with_conn(|conn| {
            let updated = if completed {
                conn.execute(
                    "UPDATE subtasks SET
                        completed_at = CASE WHEN completed = 1 THEN completed_at
                                            ELSE MAX(?1, created_at) END,
                        completed = 1
                     WHERE id = ?2",
                    params![at.timestamp_millis(), subtask_id],
                )?
            } else {
                conn.execute(
                    "UPDATE subtasks SET completed = 0, completed_at = NULL WHERE id = ?1",
                    params![subtask_id],
                )?
            };

            if updated == 0 {
                return Err(AppError::subtask_not_found(subtask_id));
            }
            get_subtask_internal(conn, subtask_id)
        })?;

        debug!(subtask_id, completed, "Subtask completion updated");
        Ok(subtask)
    }

    /// Flip a subtask's completion flag.
    pub fn toggle_subtask_completion(&self, subtask_id: i64) -> AppResult<Subtask> {
        let now = Utc::now().timestamp_millis();
        let subtask = self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE subtasks SET
                    completed_at = CASE WHEN completed = 1 THEN NULL
                                        ELSE MAX(?1, created_at) END,
                    completed = 1 - completed
                 WHERE id = ?2",
                params![now, subtask_id],
            )?;
            if updated == 0 {
                return Err(AppError::subtask_not_found(subtask_id));
            }
            get_subtask_internal(conn, subtask_id)
        })?;

        debug!(subtask_id, completed = subtask.completed, "Subtask completion toggled");
        Ok(subtask)
    }

    /// Delete a single subtask. Returns the owning task id.
    pub fn delete_subtask(&self, subtask_id: i64) -> AppResult<i64> {
        let task_id = self.with_conn(|conn| {
            let subtask = get_subtask_internal(conn, subtask_id)?;
            conn.execute("DELETE FROM subtasks WHERE id = ?1", params![subtask_id])?;
            Ok(subtask.task_id)
        })?;

        info!(task_id, subtask_id, "Subtask deleted");
        Ok(task_id)
    }
}

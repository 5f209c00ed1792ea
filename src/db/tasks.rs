//! Task CRUD and completion toggles.

use super::subtasks::list_subtasks_internal;
use super::{Database, optional_timestamp_column, require_title, timestamp_column};
use crate::error::{AppError, AppResult};
use crate::types::{DeletedTask, Task, TaskCounts, TaskWithSubtasks};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

pub(crate) const TASK_COLUMNS: &str =
    "id, title, description, image_path, created_at, completed, completed_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        image_path: row.get("image_path")?,
        created_at: timestamp_column(row, "created_at")?,
        completed: row.get("completed")?,
        completed_at: optional_timestamp_column(row, "completed_at")?,
    })
}

/// Internal helper to get a task using an existing connection (avoids deadlock).
pub(crate) fn get_task_internal(conn: &Connection, task_id: i64) -> AppResult<Task> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![task_id],
        parse_task_row,
    )
    .optional()?
    .ok_or_else(|| AppError::task_not_found(task_id))
}

/// Run a task query and attach each task's subtasks.
pub(crate) fn query_tasks_with_subtasks(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> AppResult<Vec<TaskWithSubtasks>> {
    let mut stmt = conn.prepare(sql)?;
    let tasks = stmt
        .query_map(params, parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    tasks
        .into_iter()
        .map(|task| {
            let subtasks = list_subtasks_internal(conn, task.id)?;
            Ok(TaskWithSubtasks { task, subtasks })
        })
        .collect()
}

/// Blank optional text is stored as NULL.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Database {
    /// Create a new task stamped with the current time.
    pub fn create_task(
        &self,
        title: &str,
        description: Option<String>,
        image_path: Option<String>,
    ) -> AppResult<Task> {
        self.create_task_at(title, description, image_path, Utc::now())
    }

    /// Create a new task with an explicit creation time.
    pub fn create_task_at(
        &self,
        title: &str,
        description: Option<String>,
        image_path: Option<String>,
        created_at: DateTime<Utc>,
    ) -> AppResult<Task> {
        let title = require_title(title)?;
        let description = non_blank(description);

        let task = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (title, description, image_path, created_at, completed)
                 VALUES (?1, ?2, ?3, ?4, 0)",
                params![title, description, image_path, created_at.timestamp_millis()],
            )?;
            get_task_internal(conn, conn.last_insert_rowid())
        })?;

        info!(task_id = task.id, title = %task.title, "Task created");
        Ok(task)
    }

    /// Get a task by id.
    pub fn get_task(&self, task_id: i64) -> AppResult<Task> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// Get a task with its subtasks.
    pub fn get_task_with_subtasks(&self, task_id: i64) -> AppResult<TaskWithSubtasks> {
        self.with_conn(|conn| {
            let task = get_task_internal(conn, task_id)?;
            let subtasks = list_subtasks_internal(conn, task_id)?;
            Ok(TaskWithSubtasks { task, subtasks })
        })
    }

    /// Set or clear completion, stamping the current time on a false->true transition.
    pub fn set_task_completion(&self, task_id: i64, completed: bool) -> AppResult<Task> {
        self.set_task_completion_at(task_id, completed, Utc::now())
    }

    /// Set or clear completion with an explicit completion time.
    ///
    /// The flag and the timestamp change in one statement. Completing an already
    /// completed task keeps its original timestamp; the stored timestamp is never
    /// earlier than `created_at`.
    pub fn set_task_completion_at(
        &self,
        task_id: i64,
        completed: bool,
        at: DateTime<Utc>,
    ) -> AppResult<Task> {
        let task = self.with_conn(|conn| {
            let updated = if completed {
                conn.execute(
                    "UPDATE tasks SET
                        completed_at = CASE WHEN completed = 1 THEN completed_at
                                            ELSE MAX(?1, created_at) END,
                        completed = 1
                     WHERE id = ?2",
                    params![at.timestamp_millis(), task_id],
                )?
            } else {
                conn.execute(
                    "UPDATE tasks SET completed = 0, completed_at = NULL WHERE id = ?1",
                    params![task_id],
                )?
            };

            if updated == 0 {
                return Err(AppError::task_not_found(task_id));
            }
            get_task_internal(conn, task_id)
        })?;

        debug!(task_id, completed, "Task completion updated");
        Ok(task)
    }

    /// Flip a task's completion flag.
    pub fn toggle_task_completion(&self, task_id: i64) -> AppResult<Task> {
        let now = Utc::now().timestamp_millis();
        let task = self.with_conn(|conn| {
            // Right-hand sides see the pre-update row.
            let updated = conn.execute(
                "UPDATE tasks SET
                    completed_at = CASE WHEN completed = 1 THEN NULL
                                        ELSE MAX(?1, created_at) END,
                    completed = 1 - completed
                 WHERE id = ?2",
                params![now, task_id],
            )?;
            if updated == 0 {
                return Err(AppError::task_not_found(task_id));
            }
            get_task_internal(conn, task_id)
        })?;

        debug!(task_id, completed = task.completed, "Task completion toggled");
        Ok(task)
    }

    /// Delete a task and all of its subtasks in one transaction.
    ///
    /// The returned [`DeletedTask`] carries the image reference; removing the file
    /// is left to the image store so a missing file never fails the delete.
    pub fn delete_task(&self, task_id: i64) -> AppResult<DeletedTask> {
        let deleted = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let image_path: Option<String> = tx
                .query_row(
                    "SELECT image_path FROM tasks WHERE id = ?1",
                    params![task_id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| AppError::task_not_found(task_id))?;

            let subtasks_removed =
                tx.execute("DELETE FROM subtasks WHERE task_id = ?1", params![task_id])?;
            tx.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;

            tx.commit()?;
            Ok(DeletedTask {
                id: task_id,
                subtasks_removed,
                image_path,
            })
        })?;

        info!(
            task_id,
            subtasks_removed = deleted.subtasks_removed,
            "Task deleted"
        );
        Ok(deleted)
    }

    /// Incomplete tasks, newest-created first.
    pub fn list_incomplete(&self) -> AppResult<Vec<TaskWithSubtasks>> {
        self.with_conn(|conn| {
            query_tasks_with_subtasks(
                conn,
                &format!(
                    "SELECT {TASK_COLUMNS} FROM tasks
                     WHERE completed = 0
                     ORDER BY created_at DESC, id DESC"
                ),
                [],
            )
        })
    }

    /// Completed tasks, newest-completed first.
    pub fn list_completed(&self) -> AppResult<Vec<TaskWithSubtasks>> {
        self.with_conn(|conn| {
            query_tasks_with_subtasks(
                conn,
                &format!(
                    "SELECT {TASK_COLUMNS} FROM tasks
                     WHERE completed = 1
                     ORDER BY completed_at DESC, id DESC"
                ),
                [],
            )
        })
    }

    /// Count tasks, completed tasks and subtasks.
    pub fn count_tasks(&self) -> AppResult<TaskCounts> {
        self.with_conn(|conn| {
            let (total, completed): (i64, i64) = conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(completed), 0) FROM tasks",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            let subtasks: i64 =
                conn.query_row("SELECT COUNT(*) FROM subtasks", [], |row| row.get(0))?;

            Ok(TaskCounts {
                total,
                completed,
                subtasks,
            })
        })
    }
}

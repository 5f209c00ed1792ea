//! Database layer: the task store.
//!
//! A [`Database`] owns one SQLite connection. Callers never hold the connection
//! directly; every operation borrows it through [`Database::with_conn`] or
//! [`Database::with_conn_mut`], and the lock is released when the closure returns.

pub mod calendar;
pub mod subtasks;
pub mod tasks;

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let conn = Connection::open(path.as_ref())?;

        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        debug!(path = %path.as_ref().display(), "Database opened");

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;

        Ok(db)
    }

    fn run_migrations(&self) -> AppResult<()> {
        let mut conn = self.lock()?;
        let report = embedded::migrations::runner().run(&mut *conn)?;
        for migration in report.applied_migrations() {
            debug!(version = migration.version(), name = migration.name(), "Applied migration");
        }
        Ok(())
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::internal("database connection lock poisoned"))
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut Connection) -> AppResult<T>,
    {
        let mut conn = self.lock()?;
        f(&mut conn)
    }
}

/// Read a millisecond timestamp column.
pub(crate) fn timestamp_column(row: &Row, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(column)?;
    millis_to_datetime(row, column, ms)
}

/// Read a nullable millisecond timestamp column.
pub(crate) fn optional_timestamp_column(
    row: &Row,
    column: &str,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let ms: Option<i64> = row.get(column)?;
    ms.map(|ms| millis_to_datetime(row, column, ms)).transpose()
}

fn millis_to_datetime(row: &Row, column: &str, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        let index = row.as_ref().column_index(column).unwrap_or(0);
        rusqlite::Error::IntegralValueOutOfRange(index, ms)
    })
}

/// Reject blank titles before they reach the `CHECK` constraint.
pub(crate) fn require_title(title: &str) -> AppResult<&str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::missing_field("title"));
    }
    Ok(trimmed)
}

//! Configuration types and structures.

use crate::calendar::ViewType;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default port for the web server.
pub const DEFAULT_PORT: u16 = 5000;

/// Default upload limit: 16 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub uploads: UploadConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind (0 picks a free port).
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("task-calendar/todo.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Image upload settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory where images are stored.
    #[serde(default = "default_upload_dir")]
    pub dir: PathBuf,

    /// Maximum request body size for uploads, in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Accepted file extensions, without the dot.
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: default_upload_dir(),
            max_bytes: default_max_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("task-calendar/uploads")
}

fn default_max_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_allowed_extensions() -> Vec<String> {
    ["png", "jpg", "jpeg", "gif"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Calendar page settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// View used when the request names none (or an unknown one).
    #[serde(default)]
    pub default_view: ViewType,
}

impl Config {
    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Ensure the upload directory exists.
    pub fn ensure_upload_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.uploads.dir)?;
        Ok(())
    }
}

//! Image attachments stored on disk next to the database.
//!
//! Stored names are `{YYYYmmddHHMMSS}_{sanitized original name}`. The task store
//! keeps only that name; this module owns the files.

use crate::config::UploadConfig;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory-backed store for task images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    allowed_extensions: Vec<String>,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>, allowed_extensions: &[String], max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            allowed_extensions: allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_bytes,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(&config.dir, &config.allowed_extensions, config.max_bytes)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// True when the name has an allowed extension (case-insensitive).
    pub fn allowed_file(&self, filename: &str) -> bool {
        filename
            .rsplit_once('.')
            .map(|(_, ext)| {
                let ext = ext.to_ascii_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }

    /// Validate and write an uploaded image, returning its stored name.
    pub fn save(&self, original_name: &str, bytes: &[u8], now: DateTime<Utc>) -> AppResult<String> {
        if bytes.len() > self.max_bytes {
            return Err(AppError::UploadTooLarge {
                max_bytes: self.max_bytes,
            });
        }

        let sanitized = secure_filename(original_name);
        if sanitized.is_empty()
            || !self.allowed_file(original_name)
            || !self.allowed_file(&sanitized)
        {
            return Err(AppError::upload_rejected(format!(
                "File type not allowed! Allowed types: {}",
                self.allowed_extensions.join(", ")
            )));
        }

        std::fs::create_dir_all(&self.dir)?;

        let stamp = now.format("%Y%m%d%H%M%S");
        let mut stored = format!("{stamp}_{sanitized}");
        let mut attempt = 1;
        while self.dir.join(&stored).exists() {
            stored = format!("{stamp}_{attempt}_{sanitized}");
            attempt += 1;
        }

        std::fs::write(self.dir.join(&stored), bytes)?;
        info!(file = %stored, bytes = bytes.len(), "Image stored");
        Ok(stored)
    }

    /// Full path of a stored image, if the name is a plain file name.
    pub fn path_for(&self, stored_name: &str) -> Option<PathBuf> {
        is_plain_file_name(stored_name).then(|| self.dir.join(stored_name))
    }

    /// Remove a stored image. Failures are logged and otherwise ignored.
    pub fn discard(&self, stored_name: &str) {
        let Some(path) = self.path_for(stored_name) else {
            warn!(file = %stored_name, "Refusing to remove image outside the upload directory");
            return;
        };

        match std::fs::remove_file(&path) {
            Ok(()) => debug!(file = %stored_name, "Image removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(file = %stored_name, "Image already gone")
            }
            Err(e) => warn!(file = %stored_name, error = %e, "Failed to remove image"),
        }
    }
}

pub fn too_large_message(max_bytes: usize) -> String {
    AppError::UploadTooLarge { max_bytes }.to_string()
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

/// Reduce a client-supplied file name to a safe ASCII name.
///
/// Keeps the last path component, turns whitespace runs into `_`, drops
/// everything outside `[A-Za-z0-9_.-]` and trims leading/trailing `.` and `_`.
pub fn secure_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    base.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c: char| c == '.' || c == '_')
        .to_string()
}

//! Error taxonomy shared by the store, the image store and the web layer.

use serde::Serialize;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (4xx-like)
    MissingRequiredField,
    InvalidId,
    UploadRejected,
    UploadTooLarge,

    // Not found errors
    TaskNotFound,
    SubtaskNotFound,

    // Internal errors
    DatabaseError,
    InternalError,
}

/// Kind of record an id referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Task,
    Subtask,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entity::Task => write!(f, "Task"),
            Entity::Subtask => write!(f, "Subtask"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Invalid id: '{0}'")]
    InvalidId(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: i64 },

    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    #[error("File is too large! Maximum size is {}MB.", .max_bytes / (1024 * 1024))]
    UploadTooLarge { max_bytes: usize },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration failed: {0}")]
    Migration(#[from] refinery::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn missing_field(field: &'static str) -> Self {
        Self::Validation {
            field,
            message: format!("{} is required!", capitalize(field)),
        }
    }

    pub fn task_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: Entity::Task,
            id,
        }
    }

    pub fn subtask_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: Entity::Subtask,
            id,
        }
    }

    pub fn upload_rejected(reason: impl Into<String>) -> Self {
        Self::UploadRejected(reason.into())
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::MissingRequiredField,
            AppError::InvalidId(_) => ErrorCode::InvalidId,
            AppError::NotFound {
                entity: Entity::Task,
                ..
            } => ErrorCode::TaskNotFound,
            AppError::NotFound {
                entity: Entity::Subtask,
                ..
            } => ErrorCode::SubtaskNotFound,
            AppError::UploadRejected(_) => ErrorCode::UploadRejected,
            AppError::UploadTooLarge { .. } => ErrorCode::UploadTooLarge,
            AppError::Database(_) | AppError::Migration(_) => ErrorCode::DatabaseError,
            AppError::Io(_) | AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Field name for validation errors.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            AppError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// True for errors caused by the request rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation { .. }
                | AppError::InvalidId(_)
                | AppError::NotFound { .. }
                | AppError::UploadRejected(_)
                | AppError::UploadTooLarge { .. }
        )
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Result type for store and upload operations.
pub type AppResult<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_message_reads_like_a_notice() {
        let err = AppError::missing_field("title");
        assert_eq!(err.to_string(), "Title is required!");
        assert_eq!(err.field(), Some("title"));
        assert_eq!(err.code(), ErrorCode::MissingRequiredField);
    }

    #[test]
    fn not_found_codes_follow_entity() {
        assert_eq!(AppError::task_not_found(3).code(), ErrorCode::TaskNotFound);
        assert_eq!(
            AppError::subtask_not_found(3).code(),
            ErrorCode::SubtaskNotFound
        );
        assert_eq!(AppError::task_not_found(3).to_string(), "Task not found: 3");
    }

    #[test]
    fn storage_errors_are_not_client_errors() {
        let err = AppError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(!err.is_client_error());
        assert!(AppError::upload_rejected("nope").is_client_error());
    }

    #[test]
    fn too_large_message_is_in_megabytes() {
        let err = AppError::UploadTooLarge {
            max_bytes: 16 * 1024 * 1024,
        };
        assert_eq!(err.to_string(), "File is too large! Maximum size is 16MB.");
        assert_eq!(err.code(), ErrorCode::UploadTooLarge);
    }

    #[test]
    fn error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::TaskNotFound).unwrap();
        assert_eq!(json, "\"TASK_NOT_FOUND\"");
    }
}

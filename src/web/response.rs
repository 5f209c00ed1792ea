//! Response helpers: notice redirects for form posts, JSON bodies for API routes.

use crate::error::{AppError, ErrorCode};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
};
use serde::Serialize;
use tracing::{error, info};

/// Shown instead of internal error details.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Severity of a one-shot notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Error => "error",
        }
    }

    /// Anything but `error` reads as success.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(level) if level.eq_ignore_ascii_case("error") => NoticeLevel::Error,
            _ => NoticeLevel::Success,
        }
    }
}

/// Transient message carried in the redirect query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn from_query(message: Option<String>, level: Option<&str>) -> Option<Self> {
        message.filter(|m| !m.trim().is_empty()).map(|message| Notice {
            level: NoticeLevel::parse(level),
            message,
        })
    }
}

/// `303 See Other` to the index with a notice.
pub fn notice_redirect(level: NoticeLevel, message: &str) -> Redirect {
    Redirect::to(&format!(
        "/?notice={}&level={}",
        urlencoding::encode(message),
        level.as_str()
    ))
}

/// Redirect for a failed form post. Client errors are shown verbatim.
pub fn error_redirect(err: &AppError) -> Redirect {
    if err.is_client_error() {
        info!(error = %err, "Request rejected");
        notice_redirect(NoticeLevel::Error, &err.to_string())
    } else {
        error!(error = %err, "Request failed");
        notice_redirect(NoticeLevel::Error, GENERIC_FAILURE)
    }
}

/// Parse a record id taken from the URL path.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidId(raw.to_string()))
}

/// Map a store result to a notice redirect.
pub fn redirect_with<T>(
    result: Result<T, AppError>,
    success: impl FnOnce(T) -> String,
) -> Redirect {
    match result {
        Ok(value) => notice_redirect(NoticeLevel::Success, &success(value)),
        Err(err) => error_redirect(&err),
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<&'static str>,
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation { .. } | AppError::InvalidId(_) | AppError::UploadRejected(_) => {
            StatusCode::BAD_REQUEST
        }
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        AppError::Database(_)
        | AppError::Migration(_)
        | AppError::Io(_)
        | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let message = if self.is_client_error() {
            self.to_string()
        } else {
            error!(error = %self, "Request failed");
            GENERIC_FAILURE.to_string()
        };

        let body = ErrorBody {
            code: self.code(),
            message,
            field: self.field(),
        };
        (status, Json(body)).into_response()
    }
}

/// Body of the JSON delete routes.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

pub fn delete_response<T>(result: Result<T, AppError>) -> (StatusCode, Json<DeleteResponse>) {
    match result {
        Ok(_) => (StatusCode::OK, Json(DeleteResponse { success: true })),
        Err(err) => {
            if err.is_client_error() {
                info!(error = %err, "Delete rejected");
            } else {
                error!(error = %err, "Delete failed");
            }
            (status_for(&err), Json(DeleteResponse { success: false }))
        }
    }
}

//! Task routes: index page, add/complete/delete form posts and the JSON delete.

use super::render;
use super::response::{Notice, delete_response, error_redirect, parse_id, redirect_with};
use super::server::AppState;
use crate::error::{AppError, AppResult};
use crate::types::{DeletedTask, Task};
use axum::{
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error};

/// Query parameters for the index page.
#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    notice: Option<String>,
    level: Option<String>,
}

pub async fn index(State(state): State<AppState>, Query(params): Query<IndexParams>) -> Response {
    let notice = Notice::from_query(params.notice, params.level.as_deref());
    let db = state.db();

    let lists = db.list_incomplete().and_then(|incomplete| {
        Ok((incomplete, db.list_completed()?, db.count_tasks()?))
    });

    match lists {
        Ok((incomplete, completed, counts)) => Html(render::index_page(
            &incomplete,
            &completed,
            &counts,
            state.images().allowed_extensions(),
            state.images().max_bytes(),
            notice.as_ref(),
        ))
        .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to load task lists");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render::error_page("Could not load tasks.")),
            )
                .into_response()
        }
    }
}

/// Fields of the add-task multipart form.
#[derive(Debug, Default)]
struct NewTaskForm {
    title: String,
    description: Option<String>,
    /// Original file name and contents.
    image: Option<(String, Vec<u8>)>,
}

fn multipart_error(err: MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UploadTooLarge { max_bytes }
    } else {
        AppError::upload_rejected(err.body_text())
    }
}

async fn read_task_form(multipart: &mut Multipart, max_bytes: usize) -> AppResult<NewTaskForm> {
    let mut form = NewTaskForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("title") => {
                form.title = field.text().await.map_err(|e| multipart_error(e, max_bytes))?;
            }
            Some("description") => {
                form.description =
                    Some(field.text().await.map_err(|e| multipart_error(e, max_bytes))?);
            }
            Some("image") => {
                let file_name = field.file_name().map(str::to_owned).unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_bytes))?;
                // Browsers send an empty part when no file was chosen.
                if !file_name.is_empty() {
                    form.image = Some((file_name, bytes.to_vec()));
                }
            }
            other => debug!(field = ?other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// Validate, store the image, then insert. The image is removed again if the insert fails.
fn create_task_from_form(state: &AppState, form: NewTaskForm) -> AppResult<Task> {
    if form.title.trim().is_empty() {
        return Err(AppError::missing_field("title"));
    }

    let image_path = match &form.image {
        Some((name, bytes)) => Some(state.images().save(name, bytes, Utc::now())?),
        None => None,
    };

    match state
        .db()
        .create_task(&form.title, form.description, image_path.clone())
    {
        Ok(task) => Ok(task),
        Err(e) => {
            if let Some(stored) = &image_path {
                state.images().discard(stored);
            }
            Err(e)
        }
    }
}

pub async fn add_task(State(state): State<AppState>, mut multipart: Multipart) -> Redirect {
    let form = match read_task_form(&mut multipart, state.images().max_bytes()).await {
        Ok(form) => form,
        Err(e) => return error_redirect(&e),
    };
    redirect_with(create_task_from_form(&state, form), |_| {
        "Task added successfully!".to_string()
    })
}

pub async fn complete_task(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    let result = parse_id(&id).and_then(|id| state.db().set_task_completion(id, true));
    redirect_with(result, |task| {
        format!("Task '{}' completed!", task.title)
    })
}

pub async fn uncomplete_task(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    let result = parse_id(&id).and_then(|id| state.db().set_task_completion(id, false));
    redirect_with(result, |task| {
        format!("Task '{}' marked as not completed.", task.title)
    })
}

pub async fn toggle_task(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    let result = parse_id(&id).and_then(|id| state.db().toggle_task_completion(id));
    redirect_with(result, |_| {
        "Task updated successfully!".to_string()
    })
}

/// Cascade delete, then drop the image once the rows are gone.
fn delete_task_and_image(state: &AppState, id: i64) -> AppResult<DeletedTask> {
    let deleted = state.db().delete_task(id)?;
    if let Some(image) = &deleted.image_path {
        state.images().discard(image);
    }
    Ok(deleted)
}

pub async fn delete_task(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    let result = parse_id(&id).and_then(|id| delete_task_and_image(&state, id));
    redirect_with(result, |_| {
        "Task deleted successfully!".to_string()
    })
}

/// `DELETE /tasks/{id}`
pub async fn delete_task_json(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    delete_response(parse_id(&id).and_then(|id| delete_task_and_image(&state, id)))
}

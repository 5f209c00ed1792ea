//! Subtask routes.

use super::response::{delete_response, parse_id, redirect_with};
use super::server::AppState;
use crate::error::AppError;
use crate::types::Subtask;
use axum::{
    Form,
    extract::{Json, Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct SubtaskForm {
    #[serde(default)]
    title: String,
}

pub async fn add_subtask(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Form(form): Form<SubtaskForm>,
) -> Redirect {
    let result = parse_id(&task_id).and_then(|id| state.db().create_subtask(id, &form.title));
    redirect_with(result, |_| {
        "Subtask added successfully!".to_string()
    })
}

/// `POST /complete_subtask/{id}` and `POST /subtasks/{id}/complete` both toggle.
pub async fn toggle_subtask(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    let result = parse_id(&id).and_then(|id| state.db().toggle_subtask_completion(id));
    redirect_with(result, |subtask| {
        if subtask.completed {
            "Subtask completed!".to_string()
        } else {
            "Subtask marked as not completed.".to_string()
        }
    })
}

pub async fn delete_subtask(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    let result = parse_id(&id).and_then(|id| state.db().delete_subtask(id));
    redirect_with(result, |_| {
        "Subtask deleted successfully!".to_string()
    })
}

/// `DELETE /subtasks/{id}`
pub async fn delete_subtask_json(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    delete_response(parse_id(&id).and_then(|id| state.db().delete_subtask(id)))
}

/// `GET /get_subtasks/{id}`, oldest first.
pub async fn get_subtasks(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<Subtask>>, AppError> {
    let task_id = parse_id(&task_id)?;
    Ok(Json(state.db().list_subtasks(task_id)?))
}

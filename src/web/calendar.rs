//! Calendar routes. Bad `view`/`date` values fall back instead of failing.

use super::render;
use super::server::AppState;
use crate::calendar::{CalendarReport, DateWindow, ViewType, parse_anchor};
use crate::error::{AppError, AppResult};
use crate::types::TaskWithSubtasks;
use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::error;

#[derive(Debug, Default, Deserialize)]
pub struct CalendarParams {
    view: Option<String>,
    date: Option<String>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn resolve(state: &AppState, params: &CalendarParams) -> (ViewType, NaiveDate) {
    (
        ViewType::parse_or(params.view.as_deref(), state.default_view()),
        parse_anchor(params.date.as_deref(), today()),
    )
}

fn build_report(state: &AppState, params: &CalendarParams) -> AppResult<CalendarReport> {
    let (view, anchor) = resolve(state, params);
    CalendarReport::build(state.db(), view, anchor)
}

/// `GET /calendar`
pub async fn calendar_page(
    State(state): State<AppState>,
    Query(params): Query<CalendarParams>,
) -> Response {
    match build_report(&state, &params) {
        Ok(report) => Html(render::calendar_page(&report, today())).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to build calendar");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render::error_page("Could not load the calendar.")),
            )
                .into_response()
        }
    }
}

/// `GET /calendar/data`
pub async fn calendar_data(
    State(state): State<AppState>,
    Query(params): Query<CalendarParams>,
) -> Result<Json<CalendarReport>, AppError> {
    Ok(Json(build_report(&state, &params)?))
}

/// `GET /calendar/tasks`: tasks completed in the window, with subtasks.
pub async fn calendar_tasks(
    State(state): State<AppState>,
    Query(params): Query<CalendarParams>,
) -> Result<Json<Vec<TaskWithSubtasks>>, AppError> {
    let (view, anchor) = resolve(&state, &params);
    let window = DateWindow::for_view(view, anchor);
    Ok(Json(state.db().tasks_completed_in(&window)?))
}

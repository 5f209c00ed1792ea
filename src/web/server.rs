//! HTTP server: shared state, router and lifecycle.

use super::response::{NoticeLevel, notice_redirect};
use super::{calendar, subtasks, tasks};
use crate::calendar::ViewType;
use crate::config::Config;
use crate::db::Database;
use crate::uploads::{ImageStore, too_large_message};
use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use std::net::SocketAddr;
use tokio::sync::oneshot;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    db: Database,
    images: ImageStore,
    default_view: ViewType,
}

impl AppState {
    pub fn new(db: Database, images: ImageStore) -> Self {
        Self {
            db,
            images,
            default_view: ViewType::default(),
        }
    }

    pub fn from_config(db: Database, config: &Config) -> Self {
        Self::new(db, ImageStore::from_config(&config.uploads))
            .with_default_view(config.calendar.default_view)
    }

    /// View used when a calendar request names none.
    pub fn with_default_view(mut self, view: ViewType) -> Self {
        self.default_view = view;
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn default_view(&self) -> ViewType {
        self.default_view
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Turn body-limit rejections into the usual notice redirect.
async fn redirect_payload_too_large(State(state): State<AppState>, response: Response) -> Response {
    if response.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return response;
    }
    warn!(limit = state.images().max_bytes(), "Request body too large");
    notice_redirect(
        NoticeLevel::Error,
        &too_large_message(state.images().max_bytes()),
    )
    .into_response()
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.images().dir());
    let body_limit = state.images().max_bytes();

    Router::new()
        // Pages
        .route("/", get(tasks::index))
        .route("/calendar", get(calendar::calendar_page))
        // Task form posts
        .route("/add_task", post(tasks::add_task))
        .route("/complete_task/{id}", post(tasks::complete_task))
        .route("/uncomplete_task/{id}", post(tasks::uncomplete_task))
        .route("/delete_task/{id}", post(tasks::delete_task))
        .route("/tasks/{id}", delete(tasks::delete_task_json))
        .route("/tasks/{id}/complete", post(tasks::toggle_task))
        // Subtasks
        .route("/add_subtask/{id}", post(subtasks::add_subtask))
        .route("/complete_subtask/{id}", post(subtasks::toggle_subtask))
        .route("/delete_subtask/{id}", post(subtasks::delete_subtask))
        .route("/subtasks/{id}", delete(subtasks::delete_subtask_json))
        .route("/subtasks/{id}/complete", post(subtasks::toggle_subtask))
        .route("/get_subtasks/{id}", get(subtasks::get_subtasks))
        // JSON calendar
        .route("/calendar/data", get(calendar::calendar_data))
        .route("/calendar/tasks", get(calendar::calendar_tasks))
        .route("/api/health", get(health))
        .nest_service("/uploads", uploads)
        // Add middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::map_response_with_state(
            state.clone(),
            redirect_payload_too_large,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// Returns a oneshot sender that can be used to signal shutdown,
/// and the actual address the server is bound to.
pub async fn start_server(
    state: AppState,
    host: &str,
    port: u16,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    let bound_addr = listener.local_addr()?;

    info!("Task calendar listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Server shutting down");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: "healthy",
            version: "0.1.0",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
    }

    #[tokio::test]
    async fn test_payload_too_large_becomes_redirect() {
        let db = Database::open_in_memory().unwrap();
        let state = AppState::new(db, ImageStore::new("unused", &[], 16 * 1024 * 1024));

        let response = redirect_payload_too_large(
            State(state.clone()),
            StatusCode::PAYLOAD_TOO_LARGE.into_response(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response.headers()["location"].to_str().unwrap();
        assert!(location.contains("Maximum%20size%20is%2016MB"));

        let response =
            redirect_payload_too_large(State(state), StatusCode::OK.into_response()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

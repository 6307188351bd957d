//! Mock directory HTTP API.
//!
//! Serves the wire contract the synchronization core consumes:
//! - GET /api/users?page&pageSize&query&status
//! - PATCH /api/users/{id}
//! - GET /health

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::model::{User, UserPage, UserStatus};
use crate::query::key::StatusFilter;
use crate::transport::mock::MockDirectory;
use crate::transport::{Directory, MutationError, PageRequest};

/// Application state shared across handlers.
pub struct AppState {
    pub directory: Arc<MockDirectory>,
    pub config: Arc<Config>,
    pub start_time: Instant,
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/{id}", patch(update_user_status))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

/// Query parameters of the list endpoint. Missing values take the same
/// defaults canonicalization uses.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    #[serde(default = "default_page")]
    pub page: u32,

    #[serde(default = "default_page_size", rename = "pageSize")]
    pub page_size: u32,

    #[serde(default)]
    pub query: String,

    #[serde(default)]
    pub status: StatusFilter,
}

fn default_page() -> u32 {
    1
}
fn default_page_size() -> u32 {
    10
}

/// List response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct UsersEnvelope {
    pub data: UserPage,
}

/// Mutation request body.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusBody {
    pub status: UserStatus,
}

/// Mutation response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEnvelope {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<User>,

    pub message: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub user_count: usize,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListUsersQuery>,
) -> Result<Json<UsersEnvelope>, (StatusCode, Json<UpdateEnvelope>)> {
    let request = PageRequest {
        page: params.page.max(1),
        page_size: params.page_size.max(1),
        query: params.query,
        status: params.status,
    };

    match state.directory.fetch_page(&request).await {
        Ok(page) => Ok(Json(UsersEnvelope { data: page })),
        Err(error) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(UpdateEnvelope {
                success: false,
                data: None,
                message: error.to_string(),
            }),
        )),
    }
}

async fn update_user_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> impl IntoResponse {
    info!(user_id = %id, status = %body.status, "status update request");

    match state.directory.update_status(&id, body.status).await {
        Ok(update) => (
            StatusCode::OK,
            Json(UpdateEnvelope {
                success: true,
                data: Some(update.user),
                message: update.message,
            }),
        ),
        Err(MutationError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(UpdateEnvelope {
                success: false,
                data: None,
                message: "user not found".to_string(),
            }),
        ),
        Err(MutationError::Transport(message)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(UpdateEnvelope {
                success: false,
                data: None,
                message,
            }),
        ),
        Err(MutationError::Status(code)) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(UpdateEnvelope {
                success: false,
                data: None,
                message: format!("directory returned status {code}"),
            }),
        ),
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        user_count: state.directory.user_count().await,
    })
}

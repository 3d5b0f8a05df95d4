//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{ChatRequest, ChatResponse, ErrorResponse, VersionResponse};
use super::AppState;
use crate::profile::{ProfileForm, MAX_AVATAR_SIZE};
use crate::runtime::{ConversationHandle, ConversationSnapshot};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Setup body: a base64 avatar at the size cap plus room for the names
#[allow(clippy::cast_possible_truncation)]
const SESSION_BODY_LIMIT: usize = (MAX_AVATAR_SIZE as usize).div_ceil(3) * 4 + 64 * 1024;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Profile setup and current snapshot
        .route(
            "/api/session",
            post(create_session)
                .get(get_session)
                .layer(DefaultBodyLimit::max(SESSION_BODY_LIMIT)),
        )
        // User actions
        .route("/api/chat", post(send_chat))
        // SSE streaming
        .route("/api/stream", get(stream_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Setup
// ============================================================

async fn create_session(
    State(state): State<AppState>,
    Json(form): Json<ProfileForm>,
) -> Result<Json<ConversationSnapshot>, AppError> {
    let mut session = state.session.write().await;
    if session.is_some() {
        return Err(AppError::Conflict("Session already set up".to_string()));
    }

    let config = form
        .submit()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let handle = ConversationHandle::initialize(config, state.backend.clone())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    tracing::info!(session_id = %handle.session_id(), "Session created");

    let snapshot = handle.snapshot();
    *session = Some(handle);
    Ok(Json(snapshot))
}

async fn get_session(
    State(state): State<AppState>,
) -> Result<Json<ConversationSnapshot>, AppError> {
    let handle = active_session(&state).await?;
    Ok(Json(handle.snapshot()))
}

async fn stream_session(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let handle = active_session(&state).await?;
    Ok(sse_stream(handle.subscribe()))
}

// ============================================================
// User Actions
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let handle = active_session(&state).await?;
    handle
        .submit(req.text)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(ChatResponse { queued: true }))
}

async fn get_version() -> Json<VersionResponse> {
    Json(VersionResponse::default())
}

async fn active_session(state: &AppState) -> Result<ConversationHandle, AppError> {
    state
        .current()
        .await
        .ok_or_else(|| AppError::NotFound("No session set up yet".to_string()))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

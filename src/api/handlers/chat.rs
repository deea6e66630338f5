//! Session bootstrap handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::info;

use crate::api::server::AppState;
use crate::error::StardustError;
use crate::models::NewSessionRequest;

/// Create a new session.
///
/// Runs the three-way bootstrap (proxy assignment, session storage,
/// driver warm-up) and returns the assembled handles. Served on both
/// `/chat/new-session` and the legacy `/chat/new-chat` path.
pub async fn new_session(
    State(state): State<AppState>,
    Json(req): Json<NewSessionRequest>,
) -> Result<impl IntoResponse, StardustError> {
    if req.flow.is_empty() {
        return Err(StardustError::InvalidRequest("flow is required".to_string()));
    }
    if req.agent.is_empty() {
        return Err(StardustError::InvalidRequest(
            "agent is required".to_string(),
        ));
    }

    let bootstrap = state.coordinator.bootstrap(&req).await?;

    info!(
        session = %bootstrap.session_id,
        proxy = %bootstrap.proxy,
        flow = %req.flow,
        "New session created"
    );

    Ok((StatusCode::CREATED, Json(bootstrap)))
}

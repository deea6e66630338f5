//! Process lifecycle endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::info;

use crate::api::server::AppState;

/// Request graceful process termination.
///
/// Signals the shared shutdown channel; the response is sent before the
/// servers drain, so the caller gets an acknowledgement.
pub async fn engine_quit(State(state): State<AppState>) -> impl IntoResponse {
    info!("Engine quit requested");
    let _ = state.shutdown_tx.send(true);

    (StatusCode::OK, Json(json!({ "status": "quitting" })))
}

//! Proxy group management handlers
//!
//! The administrative mutation path: every change goes through the registry
//! first (which enforces the invariants) and then writes through to the
//! group repository so a restart reproduces the same state.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::middleware::AuthenticatedUser;
use crate::api::server::AppState;
use crate::error::StardustError;
use crate::models::{ProxyGroup, UpsertGroupRequest};
use crate::registry::RotationStrategy;

/// Query parameters for picking a proxy
#[derive(Debug, Deserialize, Default)]
pub struct PickQuery {
    pub strategy: Option<String>,
}

/// List all groups
pub async fn list_groups(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, StardustError> {
    Ok(Json(state.registry.list()))
}

/// Get a single group
pub async fn get_group(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StardustError> {
    let group = state.registry.get(&id)?;
    Ok(Json(group))
}

/// Insert or replace a group.
///
/// The registry and the durable store must stay in agreement: if the
/// persistence write fails, the registry is restored to its prior state
/// before the error is returned.
pub async fn upsert_group(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
    Json(req): Json<UpsertGroupRequest>,
) -> Result<impl IntoResponse, StardustError> {
    let group = ProxyGroup::new(id, req.name, req.proxies);

    let previous = state.registry.get(&group.id).ok();
    state.registry.upsert(group.clone())?;

    if let Err(e) = state.groups.upsert(&group).await {
        warn!(group = %group.id, "Persisting group failed, restoring registry: {}", e);
        match previous {
            Some(prev) => {
                let _ = state.registry.upsert(prev);
            }
            None => state.registry.remove(&group.id),
        }
        return Err(e);
    }

    info!(group = %group.id, members = group.len(), "Upserted proxy group");

    Ok((StatusCode::OK, Json(group)))
}

/// Remove a group.
///
/// Same consistency rule as upsert: a failed durable delete restores the
/// registry entry.
pub async fn remove_group(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StardustError> {
    let previous = state.registry.get(&id).ok();
    state.registry.remove(&id);

    if let Err(e) = state.groups.remove(&id).await {
        warn!(group = %id, "Deleting group failed, restoring registry: {}", e);
        if let Some(prev) = previous {
            let _ = state.registry.upsert(prev);
        }
        return Err(e);
    }

    info!(group = %id, "Removed proxy group");

    Ok(StatusCode::NO_CONTENT)
}

/// Pick one proxy from a group under a rotation strategy
pub async fn pick_proxy(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
    Query(query): Query<PickQuery>,
) -> Result<impl IntoResponse, StardustError> {
    let strategy = query
        .strategy
        .as_deref()
        .map(RotationStrategy::from_str)
        .unwrap_or_default();

    let proxy = state.registry.pick(&id, strategy)?;
    // Serialization hides credentials; callers needing them use the RPC surface
    Ok(Json(proxy))
}

// Pull/push delta synchronization endpoints.

use axum::{
    extract::{Extension, Query, State},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    handlers::{notes::NoteResponse, todos::TodoResponse},
    middleware::auth::Principal,
    services::sync::{self, ConflictRecord, NoteChange, TodoChange},
    utils::error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct ChangesQuery {
    pub since: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChangesResponse {
    pub notes: Vec<NoteResponse>,
    pub todos: Vec<TodoResponse>,
    pub sync_timestamp: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PushRequest {
    #[serde(default)]
    pub notes: Vec<NoteChange>,
    #[serde(default)]
    pub todos: Vec<TodoChange>,
    pub device_id: String,
}

#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub accepted: i64,
    pub conflicts: Vec<ConflictRecord>,
    pub sync_timestamp: i64,
}

pub async fn changes(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    Query(params): Query<ChangesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let cursor_ms: i64 = params
        .since
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("since is required".to_string()))?
        .parse()
        .map_err(|_| ApiError::BadRequest("since must be a unix millisecond timestamp".to_string()))?;

    let pool = state.pool.clone();
    let (notes, todos, sync_timestamp) = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        sync::changes_since(&mut conn, &principal.user_id, cursor_ms).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(ChangesResponse {
        notes: notes.into_iter().map(NoteResponse::from).collect(),
        todos: todos.into_iter().map(TodoResponse::from).collect(),
        sync_timestamp,
    }))
}

pub async fn push(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    Json(req): Json<PushRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = state.pool.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        sync::apply_batch(&mut conn, &principal.user_id, req.notes, req.todos, &req.device_id)
            .map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(PushResponse {
        accepted: result.accepted,
        conflicts: result.conflicts,
        sync_timestamp: crate::services::ids::now_millis(),
    }))
}

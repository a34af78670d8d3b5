// CRUD and search handlers for the notes resource.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    middleware::auth::Principal,
    models::note::{Note, NewNote, NoteUpdate, MAX_LIMIT, DEFAULT_LIMIT},
    utils::{error::ApiError, validate_note_content, validate_note_title},
};

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageParams {
    fn clamped(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub note_type: String,
    pub modified_at: i64,
    pub modified_by_device: String,
    pub deleted_at: Option<i64>,
    pub created_at: i64,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            note_type: note.note_type,
            modified_at: note.modified_at,
            modified_by_device: note.modified_by_device,
            deleted_at: note.deleted_at,
            created_at: note.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NoteListResponse {
    pub notes: Vec<NoteResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub note_type: String,
    pub device_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub note_type: Option<String>,
    pub device_id: String,
}

pub async fn list(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (limit, offset) = params.clamped();
    let pool = state.pool.clone();
    let (notes, total) = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        Note::list(&mut conn, &principal.user_id, limit, offset).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(NoteListResponse {
        notes: notes.into_iter().map(NoteResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

pub async fn get(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    Path(note_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = state.pool.clone();
    let note = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        Note::get(&mut conn, &principal.user_id, &note_id).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(NoteResponse::from(note)))
}

pub async fn create(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_note_title(&req.title).map_err(ApiError::BadRequest)?;
    validate_note_content(&req.content).map_err(ApiError::BadRequest)?;
    if req.note_type != "note" && req.note_type != "todo_list" {
        return Err(ApiError::BadRequest("type must be 'note' or 'todo_list'".to_string()));
    }

    let pool = state.pool.clone();
    let note = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        let new_note = NewNote::new(
            principal.user_id.clone(),
            req.title,
            req.content,
            req.note_type,
            req.device_id,
        );
        Note::create(&mut conn, new_note).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok((StatusCode::CREATED, Json(NoteResponse::from(note))))
}

pub async fn update(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    Path(note_id): Path<String>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(title) = &req.title {
        validate_note_title(title).map_err(ApiError::BadRequest)?;
    }
    if let Some(content) = &req.content {
        validate_note_content(content).map_err(ApiError::BadRequest)?;
    }
    if let Some(note_type) = &req.note_type {
        if note_type != "note" && note_type != "todo_list" {
            return Err(ApiError::BadRequest("type must be 'note' or 'todo_list'".to_string()));
        }
    }

    let pool = state.pool.clone();
    let note = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        let update = NoteUpdate {
            title: req.title,
            content: req.content,
            note_type: req.note_type,
            modified_at: crate::services::ids::now_millis(),
            modified_by_device: req.device_id,
            deleted_at: None,
        };
        Note::update(&mut conn, &principal.user_id, &note_id, update).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(NoteResponse::from(note)))
}

pub async fn delete(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    Path(note_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        Note::soft_delete(&mut conn, &principal.user_id, &note_id).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn search(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params
        .q
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("q cannot be empty".to_string()))?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let pool = state.pool.clone();
    let (notes, total) = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        Note::search(&mut conn, &principal.user_id, &query, limit, offset).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(NoteListResponse {
        notes: notes.into_iter().map(NoteResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

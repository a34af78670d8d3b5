// CRUD and overdue-listing handlers for the todos resource.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    middleware::auth::Principal,
    models::note::{DEFAULT_LIMIT, MAX_LIMIT},
    models::todo::{NewTodo, Todo, TodoUpdate},
    utils::{error::ApiError, validate_todo_content},
};

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub id: String,
    pub note_id: Option<String>,
    pub line_ref: Option<String>,
    pub content: String,
    pub due_date: Option<i64>,
    pub completed: bool,
    pub modified_at: i64,
    pub modified_by_device: String,
    pub deleted_at: Option<i64>,
    pub created_at: i64,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            note_id: todo.note_id,
            line_ref: todo.line_ref,
            content: todo.content,
            due_date: todo.due_date,
            completed: todo.completed,
            modified_at: todo.modified_at,
            modified_by_device: todo.modified_by_device,
            deleted_at: todo.deleted_at,
            created_at: todo.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TodoListResponse {
    pub todos: Vec<TodoResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTodoRequest {
    pub note_id: Option<String>,
    pub line_ref: Option<String>,
    pub content: String,
    pub due_date: Option<i64>,
    pub device_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTodoRequest {
    pub note_id: Option<Option<String>>,
    pub line_ref: Option<Option<String>>,
    pub content: Option<String>,
    pub due_date: Option<Option<i64>>,
    pub completed: Option<bool>,
    pub device_id: String,
}

pub async fn list(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let pool = state.pool.clone();
    let (todos, total) = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        Todo::list(&mut conn, &principal.user_id, limit, offset).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(TodoListResponse {
        todos: todos.into_iter().map(TodoResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

pub async fn get(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    Path(todo_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = state.pool.clone();
    let todo = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        Todo::get(&mut conn, &principal.user_id, &todo_id).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(TodoResponse::from(todo)))
}

pub async fn create(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    Json(req): Json<CreateTodoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_todo_content(&req.content).map_err(ApiError::BadRequest)?;

    let pool = state.pool.clone();
    let todo = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        let new_todo = NewTodo::new(
            principal.user_id.clone(),
            req.note_id,
            req.line_ref,
            req.content,
            req.due_date,
            req.device_id,
        );
        Todo::create(&mut conn, new_todo).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok((StatusCode::CREATED, Json(TodoResponse::from(todo))))
}

pub async fn update(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    Path(todo_id): Path<String>,
    Json(req): Json<UpdateTodoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(content) = &req.content {
        validate_todo_content(content).map_err(ApiError::BadRequest)?;
    }

    let pool = state.pool.clone();
    let todo = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        let update = TodoUpdate {
            note_id: req.note_id,
            line_ref: req.line_ref,
            content: req.content,
            due_date: req.due_date,
            completed: req.completed,
            modified_at: crate::services::ids::now_millis(),
            modified_by_device: req.device_id,
            deleted_at: None,
        };
        Todo::update(&mut conn, &principal.user_id, &todo_id, update).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(TodoResponse::from(todo)))
}

pub async fn delete(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
    Path(todo_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        Todo::soft_delete(&mut conn, &principal.user_id, &todo_id).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn overdue(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = state.pool.clone();
    let todos = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        let now = crate::services::ids::now_millis();
        Todo::overdue(&mut conn, &principal.user_id, now).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(
        todos.into_iter().map(TodoResponse::from).collect::<Vec<_>>(),
    ))
}

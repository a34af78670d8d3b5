pub mod auth;
pub mod health;
pub mod notes;
pub mod sync;
pub mod todos;

use crate::app::AppState;
use crate::middleware::{auth_middleware, rate_limit_middleware};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route_layer(middleware::from_fn_with_state(state, rate_limit_middleware))
}

pub fn protected_auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

pub fn notes_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/notes", get(notes::list).post(notes::create))
        .route("/notes/search", get(notes::search))
        .route(
            "/notes/{id}",
            get(notes::get).put(notes::update).delete(notes::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

pub fn todos_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/todos", get(todos::list).post(todos::create))
        .route("/todos/overdue", get(todos::overdue))
        .route(
            "/todos/{id}",
            get(todos::get).put(todos::update).delete(todos::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

pub fn sync_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/sync/changes", get(sync::changes))
        .route("/sync/push", post(sync::push))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

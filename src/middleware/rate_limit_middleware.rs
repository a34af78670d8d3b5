use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::{app::AppState, utils::error::ApiError};

pub async fn rate_limit_middleware(
    State(app_state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Err(e) = app_state.rate_limiter.check(addr.ip()) {
        tracing::debug!(ip = %addr.ip(), error = %e, "request throttled");
        return ApiError::from(e).into_response();
    }

    next.run(request).await
}

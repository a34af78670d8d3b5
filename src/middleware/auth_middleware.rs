// Authentication middleware for protected routes: validates the bearer
// access token and injects a Principal into request extensions.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{app::AppState, middleware::auth::Principal, utils::error::ApiError};

pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => return ApiError::Unauthorized.into_response(),
    };

    match app_state.jwt_service.verify_access_token(token) {
        Ok(claims) => {
            request.extensions_mut().insert(Principal {
                user_id: claims.sub,
                device_id: claims.device_id,
            });
            next.run(request).await
        },
        Err(e) => {
            tracing::warn!(error = %e, "access token validation failed");
            ApiError::Unauthorized.into_response()
        },
    }
}

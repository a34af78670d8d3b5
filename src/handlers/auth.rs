// Registration, login, refresh and logout handlers.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

use crate::{
    app::AppState,
    middleware::auth::Principal,
    models::{
        refresh_token::{NewRefreshToken, RefreshToken},
        user::{NewUser, User},
    },
    utils::{
        error::ApiError, hash_password, normalize_email, validate_display_name, validate_password,
        verify_password,
    },
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub device_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub created_at: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&req.email).map_err(ApiError::BadRequest)?;
    validate_password(&req.password).map_err(ApiError::BadRequest)?;
    let display_name = validate_display_name(&req.display_name).map_err(ApiError::BadRequest)?;

    let password_hash = hash_password(&req.password, state.config.bcrypt_cost)?;

    let pool = state.pool.clone();
    let user = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        let new_user = NewUser::new(email, password_hash, display_name);
        User::create(&mut conn, new_user).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&req.email).map_err(ApiError::BadRequest)?;
    if req.device_id.trim().is_empty() {
        return Err(ApiError::BadRequest("device_id cannot be empty".to_string()));
    }

    let pool = state.pool.clone();
    let password = req.password.clone();
    let user = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        User::find_by_email(&mut conn, &email).map_err(|e| match e {
            crate::models::user::UserError::NotFound => ApiError::Unauthorized,
            other => ApiError::from(other),
        })
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    if !verify_password(&password, &user.password_hash)? {
        return Err(ApiError::Unauthorized);
    }

    issue_token_pair(&state, user, &req.device_id).await
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = state
        .jwt_service
        .verify_refresh_token(&req.refresh_token)
        .map_err(|_| ApiError::Unauthorized)?;

    let token_hash = crate::models::refresh_token::sha256_hex(&req.refresh_token);
    let pool = state.pool.clone();
    let stored_user_id = claims.sub.clone();
    let device_id = claims.device_id.clone();
    let token_id = claims.jti.clone();

    let user = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;

        let stored = RefreshToken::find_by_hash(&mut conn, &token_hash)
            .map_err(|_| ApiError::Unauthorized)?;
        if stored.id != token_id || stored.user_id != stored_user_id {
            return Err(ApiError::Unauthorized);
        }

        RefreshToken::delete_by_id(&mut conn, &stored.id).map_err(ApiError::from)?;

        User::find_by_id(&mut conn, &stored_user_id).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    issue_token_pair(&state, user, &device_id).await
}

pub async fn logout(
    Extension(principal): Extension<Principal>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        RefreshToken::delete_all_for_user(&mut conn, &principal.user_id).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(StatusCode::NO_CONTENT)
}

async fn issue_token_pair(
    state: &AppState,
    user: User,
    device_id: &str,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let access_token = state
        .jwt_service
        .sign_access_token(&user.id, device_id)
        .map_err(|_| ApiError::Internal)?;
    let (refresh_token, refresh_claims) = state
        .jwt_service
        .sign_refresh_token(&user.id, device_id)
        .map_err(|_| ApiError::Internal)?;

    let pool = state.pool.clone();
    let user_id = user.id.clone();
    let device = device_id.to_string();
    let refresh_token_clone = refresh_token.clone();
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get()?;
        let new_refresh = NewRefreshToken::new(
            refresh_claims.jti,
            user_id,
            device,
            &refresh_token_clone,
            refresh_claims.exp * 1000,
        );
        RefreshToken::store(&mut conn, new_refresh).map_err(ApiError::from)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok((
        StatusCode::OK,
        Json(TokenResponse {
            access_token,
            refresh_token,
            user: UserResponse::from(user),
        }),
    ))
}

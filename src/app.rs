// Application state shared across handlers.
use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    db::SqlitePool,
    services::{JwtService, RateLimitService},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub rate_limiter: Arc<RateLimitService>,
}

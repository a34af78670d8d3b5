pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

pub use app::AppState;
pub use app_config::{config, AppConfig};
pub use db::{create_pool, DatabaseConfig, SqlitePool};
pub use middleware::Principal;
pub use services::{JwtService, RateLimitService};

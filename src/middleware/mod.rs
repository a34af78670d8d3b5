// Request-boundary middleware: bearer token auth and per-IP rate limiting.

pub mod auth;
pub mod auth_middleware;
pub mod rate_limit_middleware;

pub use auth::Principal;
pub use auth_middleware::auth_middleware;
pub use rate_limit_middleware::rate_limit_middleware;

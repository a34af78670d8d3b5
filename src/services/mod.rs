// Business logic layer for the application.

pub mod ids;
pub mod jwt;
pub mod rate_limit;
pub mod sync;

pub use jwt::{JwtError, JwtService};
pub use rate_limit::{RateLimitConfig, RateLimitError, RateLimitService};
pub use sync::{ConflictRecord, PushResult, SyncError};

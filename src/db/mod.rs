pub mod pool;

pub use pool::{check_pool_health, create_pool, DatabaseConfig, PooledSqliteConnection, SqlitePool};

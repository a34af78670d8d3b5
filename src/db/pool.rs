use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use std::time::Duration;
use tracing::{error, info};

use crate::app_config;

pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;
pub type PooledSqliteConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let config = app_config::config();
        Self {
            path: config.database_path.clone(),
            max_connections: config.database_max_connections,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

/// Applies the pragmas every pooled connection needs before it is handed
/// out: WAL for concurrent readers, a busy timeout so writers queue instead
/// of failing immediately, and foreign key enforcement (off by default in
/// SQLite).
#[derive(Debug)]
struct ConnectionCustomizer;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionCustomizer {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool, anyhow::Error> {
    let manager = ConnectionManager::<SqliteConnection>::new(&config.path);

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(config.connection_timeout)
        .connection_customizer(Box::new(ConnectionCustomizer))
        .build(manager)
        .map_err(|e| {
            error!("Failed to create SQLite connection pool: {}", e);
            anyhow::anyhow!("Failed to create SQLite connection pool: {}", e)
        })?;

    // Fail fast if the file can't be opened/created.
    let _ = pool.get().map_err(|e| {
        error!("Failed to acquire initial SQLite connection: {}", e);
        anyhow::anyhow!("Failed to acquire initial SQLite connection: {}", e)
    })?;

    info!(path = %config.path, max_connections = config.max_connections, "✓ SQLite connection pool established");

    Ok(pool)
}

pub fn check_pool_health(pool: &SqlitePool) -> bool {
    match pool.get() {
        Ok(mut conn) => conn.batch_execute("SELECT 1").is_ok(),
        Err(e) => {
            error!("Database health check failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_pool_against_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let config = DatabaseConfig {
            path: path.to_string_lossy().to_string(),
            max_connections: 2,
            connection_timeout: Duration::from_secs(5),
        };
        let pool = create_pool(&config).expect("pool should be created");
        assert!(check_pool_health(&pool));
    }
}

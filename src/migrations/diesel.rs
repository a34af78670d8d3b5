// SQLite migration runner, using embedded migrations from diesel_migrations.
// diesel_migrations requires a sync connection, so the actual work runs on
// a blocking task and the pool's connection manager is used to get one.

use crate::db::SqlitePool;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::error::Error;
use tracing::{debug, info};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run all pending migrations. Returns the number of migrations applied.
pub async fn run_migrations(pool: &SqlitePool) -> Result<usize, Box<dyn Error + Send + Sync>> {
    info!("[MIGRATIONS] Checking for pending migrations...");

    let pool = pool.clone();
    let applied_count =
        tokio::task::spawn_blocking(move || -> Result<usize, Box<dyn Error + Send + Sync>> {
            let mut conn = pool
                .get()
                .map_err(|e| format!("Failed to acquire connection for migrations: {}", e))?;

            let pending = conn
                .pending_migrations(MIGRATIONS)
                .map_err(|e| format!("Failed to check pending migrations: {}", e))?;

            let pending_count = pending.len();
            if pending_count == 0 {
                debug!("[MIGRATIONS] No pending migrations to run");
                return Ok(0);
            }

            info!("[MIGRATIONS] Found {} pending migrations", pending_count);

            let mut applied_count = 0;
            for migration in pending {
                info!("[MIGRATIONS] Applying migration: {}", migration.name());
                conn.run_migration(&migration)
                    .map_err(|e| format!("Failed to run migration {}: {}", migration.name(), e))?;
                applied_count += 1;
            }

            Ok(applied_count)
        })
        .await
        .map_err(|e| format!("Migration task panicked: {}", e))??;

    Ok(applied_count)
}

/// Check migration status without applying anything.
pub async fn check_migration_status(
    pool: &SqlitePool,
) -> Result<MigrationStatus, Box<dyn Error + Send + Sync>> {
    let pool = pool.clone();
    let status = tokio::task::spawn_blocking(
        move || -> Result<MigrationStatus, Box<dyn Error + Send + Sync>> {
            let mut conn = pool
                .get()
                .map_err(|e| format!("Failed to acquire connection for migrations: {}", e))?;

            let applied = conn
                .applied_migrations()
                .map_err(|e| format!("Failed to get applied migrations: {}", e))?;

            let pending = conn
                .pending_migrations(MIGRATIONS)
                .map_err(|e| format!("Failed to get pending migrations: {}", e))?;

            Ok(MigrationStatus {
                applied_count: applied.len(),
                pending_count: pending.len(),
                applied_migrations: applied.iter().map(|m| m.to_string()).collect(),
                pending_migrations: pending.iter().map(|m| m.name().to_string()).collect(),
            })
        },
    )
    .await
    .map_err(|e| format!("Status check task panicked: {}", e))??;

    Ok(status)
}

#[derive(Debug)]
pub struct MigrationStatus {
    pub applied_count: usize,
    pub pending_count: usize,
    pub applied_migrations: Vec<String>,
    pub pending_migrations: Vec<String>,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending_count == 0
    }
}

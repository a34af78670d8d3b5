// Migration orchestrator for notesync-core.
// Embedded SQLite schema migrations, applied at startup.

pub mod diesel;

use crate::db::SqlitePool;
use std::error::Error;
use tracing::info;

/// Runs embedded migrations against the given pool. Returns the number of
/// migrations applied.
pub async fn run_all_migrations(pool: &SqlitePool) -> Result<usize, Box<dyn Error + Send + Sync>> {
    info!("[MIGRATIONS] Starting migration process");

    let applied_count = diesel::run_migrations(pool).await?;
    if applied_count > 0 {
        info!("[MIGRATIONS] ✓ Applied {} migrations", applied_count);
    } else {
        info!("[MIGRATIONS] ✓ Migrations up to date");
    }

    Ok(applied_count)
}

/// Whether migrations should run on startup. An operator can disable this
/// for deployments that apply migrations out-of-band.
pub fn should_run_migrations() -> bool {
    std::env::var("DISABLE_EMBEDDED_MIGRATIONS")
        .map(|v| v != "true" && v != "1")
        .unwrap_or(true)
}

//! # Database Migrations
//!
//! SQL files from `migrations/sqlite/` are embedded into the binary at
//! compile time and applied in filename order on startup. Applied versions
//! are tracked in `_sqlx_migrations`, so running them is idempotent.
//!
//! Never edit an applied migration; add a new numbered file instead.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Embedded migrations from the workspace `migrations/sqlite` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied");
    Ok(())
}

//! Schema migrations, compiled into the binary from `migrations/sqlite/`.
//!
//! sqlx records each applied file in `_sqlx_migrations`, so running them on
//! every start only applies what is new. Files are applied in name order;
//! once shipped, a file is never edited. Changes go in a new
//! `NNN_what_changed.sql`.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Brings the schema up to date.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(known = MIGRATOR.migrations.len(), "Applying schema migrations");
    MIGRATOR.run(pool).await?;
    info!("Schema is current");
    Ok(())
}

/// `(applied, known)` migration counts. A missing bookkeeping table counts
/// as nothing applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let known = MIGRATOR.migrations.len();

    let applied: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    Ok((usize::try_from(applied).unwrap_or(0), known))
}

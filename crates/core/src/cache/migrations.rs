//! Schema migrations for the store database.
//!
//! Applied versions are recorded in `_migrations`; each pending migration
//! runs in its own transaction together with its bookkeeping row.

use super::Error;
use tokio_rusqlite::{Connection, params};

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Ordered by version; never reorder or edit an entry once released.
const MIGRATIONS: &[Migration] =
    &[Migration { version: 1, name: "cache_stores", sql: include_str!("../../migrations/001_cache_stores.sql") }];

/// Apply every migration newer than the recorded version.
///
/// Returns the versions applied by this call, empty when the schema was
/// already current.
pub async fn run(conn: &Connection) -> Result<Vec<i64>, Error> {
    conn.call(|conn| -> Result<Vec<i64>, Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            )",
        )?;

        let current: i64 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        let mut applied = Vec::new();
        for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql)
                .map_err(|e| Error::MigrationFailed(format!("{} ({}): {}", migration.version, migration.name, e)))?;
            tx.execute(
                "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;

            tracing::debug!(version = migration.version, name = migration.name, "applied store migration");
            applied.push(migration.version);
        }

        Ok(applied)
    })
    .await
    .map_err(Error::from)
}

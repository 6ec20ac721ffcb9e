//! SQLite handle for the persistent stores.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::Connection;

/// WAL for concurrent readers; `foreign_keys` is required for entries to
/// cascade with their store.
const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;
     PRAGMA foreign_keys=ON;";

/// Store database. Cloning shares the same background connection.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open (or create) the database file, creating missing parent
    /// directories, and bring the schema up to date.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::InvalidInput(format!("cannot create {}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        let db = Self::prepare(conn).await?;
        tracing::info!(path = %path.display(), "opened cache store database");
        Ok(db)
    }

    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory().await.map_err(|e| Error::Database(e.into()))?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| conn.execute_batch(PRAGMAS)).await.map_err(Error::Database)?;

        let applied = migrations::run(&conn).await?;
        if !applied.is_empty() {
            tracing::info!(?applied, "migrated cache store schema");
        }

        Ok(Self { conn })
    }
}

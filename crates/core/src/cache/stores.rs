//! Named store operations on the SQLite cache.
//!
//! Stores live in `cache_stores`; entries cascade with their store, so
//! deleting a store is a single statement.

use async_trait::async_trait;
use bytes::Bytes;
use tokio_rusqlite::{params, rusqlite};

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use super::storage::CacheStorage;
use crate::Error;
use crate::request::{Request, Response};

fn row_to_response(row: &rusqlite::Row<'_>) -> rusqlite::Result<(u16, String, Vec<u8>)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn decode((status, headers_json, body): (u16, String, Vec<u8>)) -> Result<Response, Error> {
    let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;
    Ok(Response { status, headers, body: Bytes::from(body) })
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY id ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn open(&self, store: &str) -> Result<(), Error> {
        let store = store.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
                    params![store, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, store: &str) -> Result<bool, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![store])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Creates the store and upserts the entry in one transaction.
    async fn put(&self, store: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let store = store.to_string();
        let key_hash = compute_cache_key(&request.method, &request.url);
        let method = request.method.clone();
        let url = request.url.to_string();
        let status = response.status;
        let headers_json = serde_json::to_string(&response.headers)?;
        let body = response.body.clone();
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
                    params![&store, &now],
                )?;
                let store_id: i64 =
                    tx.query_row("SELECT id FROM cache_stores WHERE name = ?1", params![&store], |row| row.get(0))?;
                tx.execute(
                    "INSERT INTO cache_entries (store_id, key_hash, method, url, status, headers_json, body, stored_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(store_id, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![store_id, key_hash, method, url, status, headers_json, &body[..], now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn match_in(&self, store: &str, request: &Request) -> Result<Option<Response>, Error> {
        let store = store.to_string();
        let key_hash = compute_cache_key(&request.method, &request.url);
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.status, e.headers_json, e.body
                    FROM cache_entries e JOIN cache_stores s ON s.id = e.store_id
                    WHERE s.name = ?1 AND e.key_hash = ?2",
                )?;

                match stmt.query_row(params![store, key_hash], row_to_response) {
                    Ok(raw) => decode(raw).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key_hash = compute_cache_key(&request.method, &request.url);
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.status, e.headers_json, e.body
                    FROM cache_entries e JOIN cache_stores s ON s.id = e.store_id
                    WHERE e.key_hash = ?1
                    ORDER BY s.id ASC LIMIT 1",
                )?;

                match stmt.query_row(params![key_hash], row_to_response) {
                    Ok(raw) => decode(raw).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn len(&self, store: &str) -> Result<usize, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM cache_entries e JOIN cache_stores s ON s.id = e.store_id
                    WHERE s.name = ?1",
                    params![store],
                    |row| row.get(0),
                )?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

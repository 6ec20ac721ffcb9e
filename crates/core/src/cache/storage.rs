//! The named-store seam the controller talks to, plus an in-memory implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::hash::compute_cache_key;
use crate::Error;
use crate::request::{Request, Response};

/// A collection of named stores mapping requests to responses.
///
/// Each call is atomic on its own; callers never hold a lock across calls.
/// Store listing preserves creation order.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Names of every existing store, oldest first.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Create the store if it does not exist yet.
    async fn open(&self, store: &str) -> Result<(), Error>;

    /// Remove a store and all of its entries. Returns whether it existed.
    async fn delete(&self, store: &str) -> Result<bool, Error>;

    /// Insert or replace the entry for `request` in `store`, creating the store on demand.
    async fn put(&self, store: &str, request: &Request, response: &Response) -> Result<(), Error>;

    /// Look up `request` in a single store. A missing store is a miss.
    async fn match_in(&self, store: &str, request: &Request) -> Result<Option<Response>, Error>;

    /// Look up `request` across every store, oldest store first.
    async fn match_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        for store in self.keys().await? {
            if let Some(found) = self.match_in(&store, request).await? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Number of entries in `store`, zero when it does not exist.
    async fn len(&self, store: &str) -> Result<usize, Error>;

    fn name(&self) -> &'static str;
}

#[derive(Default)]
struct NamedStore {
    name: String,
    entries: HashMap<String, Response>,
}

/// Process-local stores, used by tests and ephemeral deployments.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    stores: Arc<RwLock<Vec<NamedStore>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn keys(&self) -> Result<Vec<String>, Error> {
        Ok(self.stores.read().await.iter().map(|s| s.name.clone()).collect())
    }

    async fn open(&self, store: &str) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        if !stores.iter().any(|s| s.name == store) {
            stores.push(NamedStore { name: store.to_string(), ..Default::default() });
        }
        Ok(())
    }

    async fn delete(&self, store: &str) -> Result<bool, Error> {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|s| s.name != store);
        Ok(stores.len() != before)
    }

    async fn put(&self, store: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let key = compute_cache_key(&request.method, &request.url);
        let mut stores = self.stores.write().await;
        let idx = match stores.iter().position(|s| s.name == store) {
            Some(idx) => idx,
            None => {
                stores.push(NamedStore { name: store.to_string(), ..Default::default() });
                stores.len() - 1
            }
        };
        stores[idx].entries.insert(key, response.clone());
        Ok(())
    }

    async fn match_in(&self, store: &str, request: &Request) -> Result<Option<Response>, Error> {
        let key = compute_cache_key(&request.method, &request.url);
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .find(|s| s.name == store)
            .and_then(|s| s.entries.get(&key).cloned()))
    }

    async fn len(&self, store: &str) -> Result<usize, Error> {
        let stores = self.stores.read().await;
        Ok(stores.iter().find(|s| s.name == store).map_or(0, |s| s.entries.len()))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

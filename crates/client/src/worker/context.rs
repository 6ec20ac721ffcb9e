//! State shared by both worker variants: stores, pages, lifecycle and the
//! control-message handling they have in common.

use std::sync::Arc;

use pwa_cache_core::{AppConfig, CacheStorage};

use super::clients::ClientRegistry;
use super::lifecycle::Lifecycle;
use super::message::{ClientNotice, ControlMessage, MessageOutcome};

pub(crate) struct WorkerContext {
    pub(crate) storage: Arc<dyn CacheStorage>,
    pub(crate) clients: Arc<ClientRegistry>,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) version: String,
    /// Text of the `CACHE_CLEARED` notice.
    pub(crate) cleared_message: String,
}

impl WorkerContext {
    pub(crate) fn new(
        config: &AppConfig, storage: Arc<dyn CacheStorage>, clients: Arc<ClientRegistry>, version: String,
    ) -> Self {
        Self {
            storage,
            clients,
            lifecycle: Lifecycle::new(),
            version,
            cleared_message: config.cache_cleared_message.clone(),
        }
    }

    /// Delete every store whose name is not in `keep`. Returns the names deleted.
    ///
    /// Listing or deletion failures are logged and skipped.
    pub(crate) async fn purge_stores(&self, keep: &[&str]) -> Vec<String> {
        let names = match self.storage.keys().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(version = %self.version, error = %e, "could not list cache stores");
                return Vec::new();
            }
        };

        let stale: Vec<String> = names.into_iter().filter(|n| !keep.contains(&n.as_str())).collect();
        let results = futures_util::future::join_all(stale.iter().map(|name| self.storage.delete(name))).await;

        let mut deleted = Vec::with_capacity(stale.len());
        for (name, result) in stale.into_iter().zip(results) {
            match result {
                Ok(_) => {
                    tracing::info!(version = %self.version, store = %name, "deleted cache store");
                    deleted.push(name);
                }
                Err(e) => tracing::warn!(version = %self.version, store = %name, error = %e, "failed to delete cache store"),
            }
        }
        deleted
    }

    pub(crate) async fn handle_message(&self, payload: &serde_json::Value) -> MessageOutcome {
        let Some(message) = ControlMessage::parse(payload) else {
            tracing::debug!(version = %self.version, %payload, "ignoring unrecognised message");
            return MessageOutcome::Ignored;
        };

        match message {
            ControlMessage::SkipWaiting => {
                self.lifecycle.skip_waiting().await;
                tracing::info!(version = %self.version, "skip waiting requested");
                MessageOutcome::SkippedWaiting
            }
            ControlMessage::ClearCache => {
                let deleted = self.purge_stores(&[]).await;
                let notified = self.clients.broadcast(&ClientNotice::cache_cleared(self.cleared_message.as_str())).await;
                tracing::info!(
                    version = %self.version,
                    stores_deleted = deleted.len(),
                    pages_notified = notified,
                    "cache cleared on request"
                );
                MessageOutcome::CacheCleared { stores_deleted: deleted.len(), pages_notified: notified }
            }
        }
    }
}

//! Worker variant that never intercepts.
//!
//! It exists so the app stays installable without any risk of serving stale
//! pages: install skips waiting, activation wipes every store regardless of
//! version, and every fetch goes straight to the network.

use std::sync::Arc;

use pwa_cache_core::{AppConfig, CacheStorage, Error, Request};

use super::clients::ClientRegistry;
use super::context::WorkerContext;
use super::lifecycle::WorkerState;
use super::message::MessageOutcome;
use super::{ActivateReport, FetchOutcome};

pub struct PassThroughWorker {
    ctx: WorkerContext,
}

impl PassThroughWorker {
    pub fn new(config: &AppConfig, storage: Arc<dyn CacheStorage>, clients: Arc<ClientRegistry>) -> Self {
        Self { ctx: WorkerContext::new(config, storage, clients, format!("{}-no-cache", config.cache_version)) }
    }

    pub async fn state(&self) -> WorkerState {
        self.ctx.lifecycle.state().await
    }

    pub async fn is_waiting(&self) -> bool {
        self.ctx.lifecycle.is_waiting().await
    }

    pub async fn install(&self) -> Result<(), Error> {
        self.ctx.lifecycle.begin_install().await?;
        self.ctx.lifecycle.finish_install().await?;
        self.ctx.lifecycle.skip_waiting().await;
        tracing::info!(version = %self.ctx.version, "installed (no cache)");
        Ok(())
    }

    /// Delete every store, then take control of every page.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.ctx.lifecycle.begin_activate().await?;

        let deleted = self.ctx.purge_stores(&[]).await;
        let claimed = self.ctx.clients.claim().await;

        self.ctx.lifecycle.finish_activate().await?;
        tracing::info!(version = %self.ctx.version, deleted = deleted.len(), claimed, "activated");
        Ok(ActivateReport { deleted, claimed })
    }

    pub fn handle_fetch(&self, _request: &Request) -> FetchOutcome {
        FetchOutcome::PassThrough
    }

    pub async fn handle_message(&self, payload: &serde_json::Value) -> MessageOutcome {
        self.ctx.handle_message(payload).await
    }
}

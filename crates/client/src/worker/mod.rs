//! The offline worker sitting between pages and the network.
//!
//! Two deployable variants share lifecycle and control-message handling:
//!
//! - [`CacheController`]: versioned static/dynamic stores, per-request strategy
//! - [`PassThroughWorker`]: no interception, wipes every store on activation
//!
//! [`Worker`] holds exactly one of them, picked by [`Strategy`]. Every
//! method future must be driven to completion by the host; that is the
//! "wait until" contract of the lifecycle events.

mod context;

pub mod clients;
pub mod controller;
pub mod lifecycle;
pub mod message;
pub mod pass_through;
pub mod routes;

use std::sync::Arc;

use pwa_cache_core::{AppConfig, CacheStorage, Error, Request, Response, Strategy};
use serde::Serialize;

use crate::fetch::Network;

pub use clients::{ClientId, ClientRegistry};
pub use controller::{CacheController, InstallReport};
pub use lifecycle::{Lifecycle, WorkerState};
pub use message::{ClientNotice, ControlMessage, MessageOutcome};
pub use pass_through::PassThroughWorker;
pub use routes::{FetchPlan, Routes, classify};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Cache,
    Network,
    /// Synthesized 503 for an offline navigation with nothing cached.
    OfflineFallback,
}

/// Result of an intercepted fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not handled; the page should hit the network itself.
    PassThrough,
    Respond { response: Response, source: ResponseSource },
}

impl FetchOutcome {
    pub fn cache(response: Response) -> Self {
        FetchOutcome::Respond { response, source: ResponseSource::Cache }
    }

    pub fn network(response: Response) -> Self {
        FetchOutcome::Respond { response, source: ResponseSource::Network }
    }

    pub fn offline() -> Self {
        FetchOutcome::Respond { response: Response::offline(), source: ResponseSource::OfflineFallback }
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::Respond { response, .. } => Some(response),
            FetchOutcome::PassThrough => None,
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            FetchOutcome::Respond { source, .. } => Some(*source),
            FetchOutcome::PassThrough => None,
        }
    }
}

/// Result of activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    /// Stores removed during activation.
    pub deleted: Vec<String>,
    /// Pages taken under control.
    pub claimed: usize,
}

/// The deployed worker variant.
pub enum Worker {
    Versioned(CacheController),
    PassThrough(PassThroughWorker),
}

impl Worker {
    pub fn from_config(
        config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, clients: Arc<ClientRegistry>,
    ) -> Result<Self, Error> {
        Ok(match config.strategy {
            Strategy::Versioned => Worker::Versioned(CacheController::new(config, storage, network, clients)?),
            Strategy::PassThrough => Worker::PassThrough(PassThroughWorker::new(config, storage, clients)),
        })
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Worker::Versioned(_) => Strategy::Versioned,
            Worker::PassThrough(_) => Strategy::PassThrough,
        }
    }

    pub async fn state(&self) -> WorkerState {
        match self {
            Worker::Versioned(w) => w.state().await,
            Worker::PassThrough(w) => w.state().await,
        }
    }

    /// Installed and held back from activation.
    pub async fn is_waiting(&self) -> bool {
        match self {
            Worker::Versioned(w) => w.is_waiting().await,
            Worker::PassThrough(w) => w.is_waiting().await,
        }
    }

    pub async fn install(&self) -> Result<InstallReport, Error> {
        match self {
            Worker::Versioned(w) => w.install().await,
            Worker::PassThrough(w) => w.install().await.map(|()| InstallReport::default()),
        }
    }

    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        match self {
            Worker::Versioned(w) => w.activate().await,
            Worker::PassThrough(w) => w.activate().await,
        }
    }

    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        match self {
            Worker::Versioned(w) => w.handle_fetch(request).await,
            Worker::PassThrough(w) => Ok(w.handle_fetch(request)),
        }
    }

    pub async fn handle_message(&self, payload: &serde_json::Value) -> MessageOutcome {
        match self {
            Worker::Versioned(w) => w.handle_message(payload).await,
            Worker::PassThrough(w) => w.handle_message(payload).await,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use pwa_cache_core::{AppConfig, Error, Request, Response};
    use tokio::sync::RwLock;

    use crate::fetch::Network;

    pub(crate) fn config() -> AppConfig {
        AppConfig::default()
    }

    /// Scripted network: registered URLs answer, everything else fails.
    #[derive(Default)]
    pub(crate) struct FakeNetwork {
        routes: RwLock<HashMap<String, Option<Response>>>,
        calls: RwLock<usize>,
    }

    impl FakeNetwork {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) async fn respond(&self, url: &str, status: u16, body: &str) {
            let response = Response::new(status, vec![("content-type".into(), "text/html".into())], body.to_string());
            self.routes.write().await.insert(url.to_string(), Some(response));
        }

        pub(crate) async fn fail(&self, url: &str) {
            self.routes.write().await.insert(url.to_string(), None);
        }

        pub(crate) async fn calls(&self) -> usize {
            *self.calls.read().await
        }
    }

    #[async_trait]
    impl Network for FakeNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            *self.calls.write().await += 1;
            match self.routes.read().await.get(request.url.as_str()) {
                Some(Some(response)) => Ok(response.clone()),
                _ => Err(Error::Network(format!("{} unreachable", request.url))),
            }
        }
    }
}

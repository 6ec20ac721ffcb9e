//! Versioned cache controller.
//!
//! Keeps two stores per version:
//!
//! - static: the asset manifest, written at install and served cache-first
//! - dynamic: pages fetched network-first, used when the network is down
//!
//! Activation deletes every store belonging to another version. Bumping
//! `cache_version` is the only way entries are invalidated.

use std::sync::Arc;

use pwa_cache_core::{AppConfig, CacheStorage, Error, Request, Response};
use serde::Serialize;
use url::Url;

use super::clients::ClientRegistry;
use super::context::WorkerContext;
use super::lifecycle::WorkerState;
use super::message::MessageOutcome;
use super::routes::{FetchPlan, Routes, classify};
use super::{ActivateReport, FetchOutcome};
use crate::fetch::Network;

/// Result of pre-caching the asset manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub cached: usize,
    pub failed: Vec<String>,
}

pub struct CacheController {
    ctx: WorkerContext,
    network: Arc<dyn Network>,
    routes: Routes,
    static_store: String,
    dynamic_store: String,
}

impl CacheController {
    pub fn new(
        config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>, clients: Arc<ClientRegistry>,
    ) -> Result<Self, Error> {
        Ok(Self {
            ctx: WorkerContext::new(config, storage, clients, config.cache_version.clone()),
            network,
            routes: Routes::from_config(config)?,
            static_store: config.static_store_name(),
            dynamic_store: config.dynamic_store_name(),
        })
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    pub fn static_store(&self) -> &str {
        &self.static_store
    }

    pub fn dynamic_store(&self) -> &str {
        &self.dynamic_store
    }

    pub async fn state(&self) -> WorkerState {
        self.ctx.lifecycle.state().await
    }

    pub async fn is_waiting(&self) -> bool {
        self.ctx.lifecycle.is_waiting().await
    }

    /// Open the static store and pre-cache the manifest.
    ///
    /// Individual assets that fail to fetch, return anything but 200, or
    /// cannot be written are logged and left out; install still succeeds.
    /// Only failing to open the static store aborts install.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.ctx.lifecycle.begin_install().await?;

        if let Err(e) = self.ctx.storage.open(&self.static_store).await {
            self.ctx.lifecycle.fail_install().await;
            return Err(e);
        }

        let results = futures_util::future::join_all(self.routes.assets().iter().map(|url| self.precache(url))).await;

        let mut report = InstallReport::default();
        for (url, result) in self.routes.assets().iter().zip(results) {
            match result {
                Ok(()) => report.cached += 1,
                Err(e) => {
                    tracing::warn!(version = %self.ctx.version, url = %url, error = %e, "pre-cache failed");
                    report.failed.push(url.to_string());
                }
            }
        }

        self.ctx.lifecycle.finish_install().await?;
        self.ctx.lifecycle.skip_waiting().await;

        tracing::info!(
            version = %self.ctx.version,
            store = %self.static_store,
            cached = report.cached,
            failed = report.failed.len(),
            "installed"
        );
        Ok(report)
    }

    async fn precache(&self, url: &Url) -> Result<(), Error> {
        let request = Request::get(url.clone());
        let response = self.network.fetch(&request).await?;
        if !response.is_cacheable() {
            return Err(Error::Network(format!("status {}", response.status)));
        }
        self.ctx.storage.put(&self.static_store, &request, &response).await
    }

    /// Delete stores from other versions, then take control of every page.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.ctx.lifecycle.begin_activate().await?;

        let deleted = self.ctx.purge_stores(&[self.static_store.as_str(), self.dynamic_store.as_str()]).await;
        let claimed = self.ctx.clients.claim().await;

        self.ctx.lifecycle.finish_activate().await?;
        tracing::info!(version = %self.ctx.version, stale = deleted.len(), claimed, "activated");
        Ok(ActivateReport { deleted, claimed })
    }

    /// Serve one intercepted request.
    ///
    /// Requests reaching a worker that is not active yet are passed through.
    /// `Err` means every fallback was exhausted.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if !self.ctx.lifecycle.is_active().await {
            return Ok(FetchOutcome::PassThrough);
        }

        let plan = classify(&self.routes, request);
        tracing::debug!(method = %request.method, url = %request.url, plan = plan.as_str(), "fetch");

        match plan {
            FetchPlan::PassThrough => Ok(FetchOutcome::PassThrough),
            FetchPlan::CacheFirst => self.cache_first(request).await,
            FetchPlan::NetworkFirst { offline_document } => self.network_first(request, offline_document).await,
            FetchPlan::NetworkWithCacheFallback => self.network_or_any_cache(request).await,
        }
    }

    pub async fn handle_message(&self, payload: &serde_json::Value) -> MessageOutcome {
        self.ctx.handle_message(payload).await
    }

    async fn cache_first(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if let Some(hit) = self.lookup(&self.static_store, request).await {
            return Ok(FetchOutcome::cache(hit));
        }

        let response = self.network.fetch(request).await?;
        self.store(&self.static_store, request, &response).await;
        Ok(FetchOutcome::network(response))
    }

    async fn network_first(&self, request: &Request, offline_document: bool) -> Result<FetchOutcome, Error> {
        let err = match self.network.fetch(request).await {
            Ok(response) => {
                self.store(&self.dynamic_store, request, &response).await;
                return Ok(FetchOutcome::network(response));
            }
            Err(e) => e,
        };

        tracing::debug!(url = %request.url, error = %err, "network failed, trying dynamic store");
        if let Some(hit) = self.lookup(&self.dynamic_store, request).await {
            return Ok(FetchOutcome::cache(hit));
        }

        if !offline_document {
            return Err(err);
        }

        let root = Request::get(self.routes.root_page().clone());
        match self.ctx.storage.match_any(&root).await {
            Ok(Some(page)) => Ok(FetchOutcome::cache(page)),
            Ok(None) => Ok(FetchOutcome::offline()),
            Err(e) => {
                tracing::warn!(error = %e, "root page lookup failed");
                Ok(FetchOutcome::offline())
            }
        }
    }

    async fn network_or_any_cache(&self, request: &Request) -> Result<FetchOutcome, Error> {
        let err = match self.network.fetch(request).await {
            Ok(response) => return Ok(FetchOutcome::network(response)),
            Err(e) => e,
        };

        match self.ctx.storage.match_any(request).await {
            Ok(Some(hit)) => Ok(FetchOutcome::cache(hit)),
            Ok(None) => Err(err),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cache lookup failed");
                Err(err)
            }
        }
    }

    /// Store lookup where a store error counts as a miss.
    async fn lookup(&self, store: &str, request: &Request) -> Option<Response> {
        match self.ctx.storage.match_in(store, request).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(store, url = %request.url, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// Write a copy of `response` if it is a 200; write failures are only logged.
    async fn store(&self, store: &str, request: &Request, response: &Response) {
        if !response.is_cacheable() {
            return;
        }
        if let Err(e) = self.ctx.storage.put(store, request, response).await {
            tracing::warn!(store, url = %request.url, error = %e, "cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::testing::{FakeNetwork, config};
    use crate::worker::ResponseSource;
    use crate::worker::message::ClientNotice;
    use pwa_cache_core::{CacheDb, MemoryStorage};
    use serde_json::json;

    struct Harness {
        controller: CacheController,
        storage: Arc<MemoryStorage>,
        network: Arc<FakeNetwork>,
        clients: Arc<ClientRegistry>,
    }

    fn harness_with(config: AppConfig) -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let network = Arc::new(FakeNetwork::new());
        let clients = Arc::new(ClientRegistry::new());
        let controller = CacheController::new(&config, storage.clone(), network.clone(), clients.clone()).unwrap();
        Harness { controller, storage, network, clients }
    }

    fn harness() -> Harness {
        harness_with(config())
    }

    fn url(path: &str) -> Url {
        Url::parse("http://localhost:8000").unwrap().join(path).unwrap()
    }

    async fn serve_manifest(h: &Harness) {
        for asset in h.controller.routes().assets() {
            h.network.respond(asset.as_str(), 200, asset.path()).await;
        }
    }

    async fn activated(h: &Harness) {
        serve_manifest(h).await;
        h.controller.install().await.unwrap();
        h.controller.activate().await.unwrap();
    }

    #[tokio::test]
    async fn test_install_precaches_manifest() {
        let h = harness();
        serve_manifest(&h).await;

        let report = h.controller.install().await.unwrap();

        assert_eq!(report.cached, h.controller.routes().assets().len());
        assert!(report.failed.is_empty());
        for asset in h.controller.routes().assets() {
            let hit = h.storage.match_in(h.controller.static_store(), &Request::get(asset.clone())).await.unwrap();
            assert!(hit.is_some(), "{asset} missing from static store");
        }
        assert_eq!(h.controller.state().await, WorkerState::Installed);
        assert!(!h.controller.is_waiting().await);
    }

    #[tokio::test]
    async fn test_install_is_best_effort() {
        let h = harness();
        serve_manifest(&h).await;
        h.network.fail(url("/static/css/styles.css").as_str()).await;
        h.network.respond(url("/static/manifest.json").as_str(), 404, "missing").await;

        let report = h.controller.install().await.unwrap();

        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.cached, h.controller.routes().assets().len() - 2);
        let static_store = h.controller.static_store();
        let css = h.storage.match_in(static_store, &Request::get(url("/static/css/styles.css"))).await.unwrap();
        assert!(css.is_none());
        let js = h.storage.match_in(static_store, &Request::get(url("/static/js/ticket_form.js"))).await.unwrap();
        assert!(js.is_some());
    }

    #[tokio::test]
    async fn test_install_with_empty_manifest_opens_static_store() {
        let h = harness_with(AppConfig { precache_assets: Vec::new(), ..config() });
        h.controller.install().await.unwrap();
        assert_eq!(h.storage.keys().await.unwrap(), vec![h.controller.static_store().to_string()]);
    }

    #[tokio::test]
    async fn test_activate_purges_other_versions() {
        let h = harness();
        let req = Request::get(url("/"));
        let page = Response::new(200, Vec::new(), "old");
        h.storage.put("gestor-tickets-static-v1.0.12", &req, &page).await.unwrap();
        h.storage.put("gestor-tickets-dynamic-v1.0.12", &req, &page).await.unwrap();
        h.storage.put(h.controller.dynamic_store(), &req, &page).await.unwrap();
        h.storage.put("unrelated", &req, &page).await.unwrap();
        serve_manifest(&h).await;

        h.controller.install().await.unwrap();
        let report = h.controller.activate().await.unwrap();

        assert_eq!(report.deleted.len(), 3);
        let mut names = h.storage.keys().await.unwrap();
        names.sort();
        let mut expected = vec![h.controller.dynamic_store().to_string(), h.controller.static_store().to_string()];
        expected.sort();
        assert_eq!(names, expected);
        assert_eq!(h.controller.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_activate_claims_pages() {
        let h = harness();
        let (page, _rx) = h.clients.connect().await;
        activated(&h).await;
        assert!(h.clients.is_controlled(page).await);
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let h = harness();
        assert!(matches!(h.controller.activate().await, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_fetch_before_activation_passes_through() {
        let h = harness();
        let outcome = h.controller.handle_fetch(&Request::navigate(url("/dashboard/"))).await.unwrap();
        assert_eq!(outcome, FetchOutcome::PassThrough);
    }

    #[tokio::test]
    async fn test_non_get_passes_through() {
        let h = harness();
        activated(&h).await;
        let calls = h.network.calls().await;

        let req = Request::new("POST", url("/ticket/5/delete/"), pwa_cache_core::Destination::Document);
        let outcome = h.controller.handle_fetch(&req).await.unwrap();

        assert_eq!(outcome, FetchOutcome::PassThrough);
        assert_eq!(h.network.calls().await, calls);
    }

    #[tokio::test]
    async fn test_warm_manifest_hit_skips_network() {
        let h = harness();
        activated(&h).await;
        let calls = h.network.calls().await;

        let outcome = h.controller.handle_fetch(&Request::get(url("/static/js/ticket_list.js"))).await.unwrap();

        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        assert_eq!(h.network.calls().await, calls);
    }

    #[tokio::test]
    async fn test_cache_first_miss_stores_only_200() {
        let h = harness();
        h.controller.install().await.unwrap();
        h.controller.activate().await.unwrap();
        let js = url("/static/js/ticket_form.js");
        let css = url("/static/css/styles.css");
        h.network.respond(js.as_str(), 200, "form").await;
        h.network.respond(css.as_str(), 500, "boom").await;

        let outcome = h.controller.handle_fetch(&Request::get(js.clone())).await.unwrap();
        assert_eq!(outcome.source(), Some(ResponseSource::Network));
        let outcome = h.controller.handle_fetch(&Request::get(css.clone())).await.unwrap();
        assert_eq!(outcome.response().map(|r| r.status), Some(500));

        let static_store = h.controller.static_store();
        assert!(h.storage.match_in(static_store, &Request::get(js)).await.unwrap().is_some());
        assert!(h.storage.match_in(static_store, &Request::get(css)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_first_miss_offline_propagates() {
        let h = harness();
        h.controller.install().await.unwrap();
        h.controller.activate().await.unwrap();

        let result = h.controller.handle_fetch(&Request::get(url("/static/js/ticket_form.js"))).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_network_first_stores_in_dynamic() {
        let h = harness();
        activated(&h).await;
        let dashboard = url("/dashboard/");
        h.network.respond(dashboard.as_str(), 200, "dash").await;

        let outcome = h.controller.handle_fetch(&Request::get(dashboard.clone())).await.unwrap();

        assert_eq!(outcome.source(), Some(ResponseSource::Network));
        let stored = h.storage.match_in(h.controller.dynamic_store(), &Request::get(dashboard)).await.unwrap();
        assert_eq!(stored.unwrap().body.as_ref(), b"dash");
    }

    #[tokio::test]
    async fn test_dashboard_offline_serves_dynamic_entry() {
        let h = harness();
        activated(&h).await;
        let dashboard = url("/dashboard/");
        h.network.respond(dashboard.as_str(), 200, "dash").await;
        h.controller.handle_fetch(&Request::get(dashboard.clone())).await.unwrap();

        h.network.fail(dashboard.as_str()).await;
        let outcome = h.controller.handle_fetch(&Request::get(dashboard)).await.unwrap();

        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        assert_eq!(outcome.response().unwrap().body.as_ref(), b"dash");
    }

    #[tokio::test]
    async fn test_network_first_does_not_store_errors() {
        let h = harness();
        activated(&h).await;
        let ticket = url("/ticket/9/");
        h.network.respond(ticket.as_str(), 404, "nope").await;

        let outcome = h.controller.handle_fetch(&Request::navigate(ticket.clone())).await.unwrap();

        assert_eq!(outcome.response().map(|r| r.status), Some(404));
        assert_eq!(h.storage.len(h.controller.dynamic_store()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_offline_document_falls_back_to_root_page() {
        let h = harness();
        activated(&h).await;

        let outcome = h.controller.handle_fetch(&Request::navigate(url("/ticket/42/"))).await.unwrap();

        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        assert_eq!(outcome.response().unwrap().body.as_ref(), b"/");
    }

    #[tokio::test]
    async fn test_offline_document_without_any_cache_is_503() {
        let h = harness_with(AppConfig { precache_assets: Vec::new(), ..config() });
        h.controller.install().await.unwrap();
        h.controller.activate().await.unwrap();

        let outcome = h.controller.handle_fetch(&Request::navigate(url("/reports/"))).await.unwrap();

        assert_eq!(outcome.source(), Some(ResponseSource::OfflineFallback));
        assert_eq!(outcome.response().unwrap().status, 503);
    }

    #[tokio::test]
    async fn test_offline_dynamic_subresource_miss_propagates() {
        let h = harness();
        activated(&h).await;

        let result = h.controller.handle_fetch(&Request::get(url("/company/2/"))).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_default_get_is_not_stored() {
        let h = harness();
        activated(&h).await;
        let logo = url("/static/img/logo.png");
        h.network.respond(logo.as_str(), 200, "png").await;
        let before = h.storage.len(h.controller.dynamic_store()).await.unwrap();

        let outcome = h.controller.handle_fetch(&Request::get(logo)).await.unwrap();

        assert_eq!(outcome.source(), Some(ResponseSource::Network));
        assert_eq!(h.storage.len(h.controller.dynamic_store()).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_default_get_offline_uses_any_store() {
        let h = harness();
        activated(&h).await;
        let logo = url("/static/img/logo.png");
        h.storage.put("legacy-assets", &Request::get(logo.clone()), &Response::new(200, Vec::new(), "png")).await.unwrap();

        let outcome = h.controller.handle_fetch(&Request::get(logo)).await.unwrap();
        assert_eq!(outcome.source(), Some(ResponseSource::Cache));

        let result = h.controller.handle_fetch(&Request::get(url("/static/img/missing.png"))).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_clear_cache_message() {
        let h = harness();
        let (_, mut rx_a) = h.clients.connect().await;
        let (_, mut rx_b) = h.clients.connect().await;
        activated(&h).await;

        let outcome = h.controller.handle_message(&json!({"type": "CLEAR_CACHE"})).await;

        assert!(matches!(outcome, MessageOutcome::CacheCleared { pages_notified: 2, .. }));
        assert!(h.storage.keys().await.unwrap().is_empty());
        for rx in [&mut rx_a, &mut rx_b] {
            assert_eq!(rx.try_recv().unwrap(), ClientNotice::cache_cleared("Cache cleared successfully"));
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn test_sqlite_backend_serves_offline_dashboard() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let network = Arc::new(FakeNetwork::new());
        let clients = Arc::new(ClientRegistry::new());
        let config = config();
        let controller = CacheController::new(&config, db.clone(), network.clone(), clients).unwrap();

        let page = Response::new(200, Vec::new(), "stale");
        db.put("gestor-tickets-dynamic-v1.0.12", &Request::get(url("/")), &page).await.unwrap();
        for asset in controller.routes().assets() {
            network.respond(asset.as_str(), 200, asset.path()).await;
        }
        let dashboard = url("/dashboard/");
        network.respond(dashboard.as_str(), 200, "dash").await;

        controller.install().await.unwrap();
        let report = controller.activate().await.unwrap();
        assert_eq!(report.deleted, vec!["gestor-tickets-dynamic-v1.0.12".to_string()]);
        controller.handle_fetch(&Request::navigate(dashboard.clone())).await.unwrap();

        network.fail(dashboard.as_str()).await;
        let outcome = controller.handle_fetch(&Request::navigate(dashboard)).await.unwrap();
        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        assert_eq!(outcome.response().unwrap().body.as_ref(), b"dash");

        // never visited: falls back to the pre-cached root page
        let outcome = controller.handle_fetch(&Request::navigate(url("/ticket/3/"))).await.unwrap();
        assert_eq!(outcome.source(), Some(ResponseSource::Cache));
        assert_eq!(outcome.response().unwrap().body.as_ref(), b"/");

        let mut stores = db.keys().await.unwrap();
        stores.sort();
        assert_eq!(stores, vec![controller.dynamic_store().to_string(), controller.static_store().to_string()]);
    }

    #[tokio::test]
    async fn test_clear_cache_uses_configured_text() {
        let h = harness_with(AppConfig { cache_cleared_message: "Cache eliminado exitosamente".into(), ..config() });
        let (_, mut rx) = h.clients.connect().await;
        activated(&h).await;

        h.controller.handle_message(&json!({"type": "CLEAR_CACHE"})).await;
        assert_eq!(rx.try_recv().unwrap(), ClientNotice::cache_cleared("Cache eliminado exitosamente"));
    }

    #[tokio::test]
    async fn test_skip_waiting_message() {
        let h = harness();
        let outcome = h.controller.handle_message(&json!({"type": "SKIP_WAITING"})).await;
        assert_eq!(outcome, MessageOutcome::SkippedWaiting);
    }

    #[tokio::test]
    async fn test_unknown_message_ignored() {
        let h = harness();
        activated(&h).await;
        let stores = h.storage.keys().await.unwrap();

        let outcome = h.controller.handle_message(&json!({"type": "PURGE_EVERYTHING"})).await;

        assert_eq!(outcome, MessageOutcome::Ignored);
        assert_eq!(h.storage.keys().await.unwrap(), stores);
    }
}

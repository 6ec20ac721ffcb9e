//! Everything the tools share: config, stores, network and the booted worker.

use std::sync::Arc;

use pwa_cache_client::{ClientRegistry, Network, Worker};
use pwa_cache_core::{AppConfig, CacheStorage, Error};
use url::Url;

pub struct AppState {
    pub config: AppConfig,
    pub origin: Url,
    pub storage: Arc<dyn CacheStorage>,
    pub network: Arc<dyn Network>,
    pub clients: Arc<ClientRegistry>,
    pub worker: Worker,
}

impl AppState {
    /// Build the configured worker and drive it through install and, unless
    /// it is left waiting, activate.
    pub async fn boot(config: AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let clients = Arc::new(ClientRegistry::new());
        let worker = Worker::from_config(&config, storage.clone(), network.clone(), clients.clone())?;

        let installed = worker.install().await?;
        if worker.is_waiting().await {
            tracing::warn!(version = %config.cache_version, "installed worker is waiting; not activating");
            return Ok(Self { config, origin, storage, network, clients, worker });
        }

        let activated = worker.activate().await?;
        tracing::info!(
            strategy = ?worker.strategy(),
            version = %config.cache_version,
            backend = storage.name(),
            precached = installed.cached,
            precache_failed = installed.failed.len(),
            stale_deleted = activated.deleted.len(),
            "worker ready"
        );

        Ok(Self { config, origin, storage, network, clients, worker })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::state;
    use super::*;
    use pwa_cache_client::WorkerState;

    #[tokio::test]
    async fn test_boot_activates_worker() {
        let state = state(AppConfig::default(), true).await;
        assert_eq!(state.worker.state().await, WorkerState::Activated);
        assert_eq!(state.storage.len(&state.config.static_store_name()).await.unwrap(), state.config.precache_assets.len());
    }

    #[tokio::test]
    async fn test_boot_reports_backend() {
        let state = state(AppConfig::default(), true).await;
        assert_eq!(state.storage.name(), "memory");
        assert!(!state.worker.is_waiting().await);
    }

    #[tokio::test]
    async fn test_boot_offline_still_activates() {
        let state = state(AppConfig::default(), false).await;
        assert_eq!(state.worker.state().await, WorkerState::Activated);
        assert_eq!(state.storage.len(&state.config.static_store_name()).await.unwrap(), 0);
    }
}

//! Runtime configuration.
//!
//! Values are layered with figment, later layers winning:
//!
//! 1. built-in defaults (the ticketing app's deployed values)
//! 2. a TOML file named by `PWA_CACHE_CONFIG_FILE`
//! 3. `PWA_CACHE_*` environment variables, e.g. `PWA_CACHE_CACHE_VERSION=v1.0.14`

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

const ENV_PREFIX: &str = "PWA_CACHE_";
const CONFIG_FILE_VAR: &str = "PWA_CACHE_CONFIG_FILE";

/// Which worker variant to deploy. A deployment runs exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Versioned static/dynamic stores with per-request strategies.
    #[default]
    Versioned,
    /// No interception; purges every store on activation.
    PassThrough,
}

/// Everything the worker and its host need to boot. Missing keys take
/// their [`Default`] value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file backing the stores.
    pub db_path: PathBuf,

    /// Origin of the ticketing application; root-relative paths resolve against it.
    pub origin: String,

    pub cache_prefix: String,

    /// Embedded in both store names. Bumping it retires every older store
    /// on the next activation.
    pub cache_version: String,

    pub strategy: Strategy,

    /// Written into the static store at install, in order.
    pub precache_assets: Vec<String>,

    /// Path prefixes served network-first into the dynamic store.
    pub dynamic_prefixes: Vec<String>,

    /// Exact paths served network-first into the dynamic store.
    pub dynamic_paths: Vec<String>,

    /// Stand-in for offline documents whose own entry is missing.
    pub root_page: String,

    pub user_agent: String,

    /// Text posted to pages in the `CACHE_CLEARED` notice. The ticketing
    /// app's Spanish build uses "Cache eliminado exitosamente".
    pub cache_cleared_message: String,

    /// Upper bound on a fetched body.
    pub max_bytes: usize,

    pub timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let paths = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            db_path: PathBuf::from("./pwa-cache.sqlite"),
            origin: "http://localhost:8000".into(),
            cache_prefix: "gestor-tickets".into(),
            cache_version: "v1.0.13".into(),
            strategy: Strategy::Versioned,
            precache_assets: paths(&[
                "/",
                "/static/manifest.json",
                "/static/css/styles.css",
                "/static/js/ticket_form.js",
                "/static/js/ticket_list.js",
                "/static/icons/icon-192x192.png",
                "/static/icons/icon-512x512.png",
            ]),
            dynamic_prefixes: paths(&["/ticket/", "/company/"]),
            dynamic_paths: paths(&["/dashboard/"]),
            root_page: "/".into(),
            user_agent: "pwa-cache/0.1".into(),
            cache_cleared_message: "Cache cleared successfully".into(),
            max_bytes: 5 * 1024 * 1024,
            timeout_ms: 20_000,
        }
    }
}

impl AppConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `{prefix}-static-{version}`: pre-cached assets.
    pub fn static_store_name(&self) -> String {
        format!("{}-static-{}", self.cache_prefix, self.cache_version)
    }

    /// `{prefix}-dynamic-{version}`: network-first pages.
    pub fn dynamic_store_name(&self) -> String {
        format!("{}-dynamic-{}", self.cache_prefix, self.cache_version)
    }

    /// The origin as an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<url::Url, ConfigError> {
        let parsed = url::Url::parse(&self.origin).map_err(|e| ConfigError::invalid("origin", e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(ConfigError::invalid("origin", format!("unsupported scheme: {other}"))),
        }
    }

    /// Layer defaults, the optional TOML file and the environment, then
    /// [`validate`](Self::validate) the result.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(path) = std::env::var(CONFIG_FILE_VAR) {
            tracing::debug!(%path, "reading config file");
            figment = figment.merge(Toml::file(path));
        }

        let env = Env::prefixed(ENV_PREFIX).ignore(&["CONFIG_FILE"]).map(|key| key.as_str().to_lowercase().into());
        let config: Self = figment.merge(env).extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }
}

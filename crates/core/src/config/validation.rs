//! Checks run on an [`AppConfig`] after loading.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use crate::config::AppConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid { field: field.into(), reason: reason.into() }
    }

    fn missing(field: &str) -> Self {
        ConfigError::Missing {
            field: field.into(),
            hint: format!("set PWA_CACHE_{} or `{field}` in the config file", field.to_uppercase()),
        }
    }
}

const MAX_BYTES: RangeInclusive<usize> = 1..=50 * 1024 * 1024;
const TIMEOUT_MS: RangeInclusive<u64> = 100..=300_000;

/// Root-relative paths and absolute http(s) URLs can be fetched from the
/// origin; protocol-relative `//host` entries cannot.
fn is_routable(entry: &str) -> bool {
    if entry.starts_with('/') {
        return !entry.starts_with("//");
    }
    url::Url::parse(entry).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

/// Store names are `{prefix}-static-{version}`; whitespace would make them
/// ambiguous in logs and tool output.
fn name_part(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::missing(field));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid(field, format!("{value:?} must not contain whitespace")));
    }
    Ok(())
}

impl AppConfig {
    /// Reject configurations the controller cannot run with.
    ///
    /// An empty manifest or duplicated manifest entries only log a warning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        name_part("cache_prefix", &self.cache_prefix)?;
        name_part("cache_version", &self.cache_version)?;
        self.origin_url()?;

        let unroutable = self.precache_assets.iter().chain(std::iter::once(&self.root_page)).find(|e| !is_routable(e));
        if let Some(bad) = unroutable {
            let field = if *bad == self.root_page { "root_page" } else { "precache_assets" };
            return Err(ConfigError::invalid(field, format!("{bad:?} is neither root-relative nor an absolute http(s) URL")));
        }

        for (field, routes) in [("dynamic_prefixes", &self.dynamic_prefixes), ("dynamic_paths", &self.dynamic_paths)] {
            if let Some(bad) = routes.iter().find(|r| !r.starts_with('/')) {
                return Err(ConfigError::invalid(field, format!("{bad:?} must start with '/'")));
            }
        }

        if !MAX_BYTES.contains(&self.max_bytes) {
            return Err(ConfigError::invalid("max_bytes", format!("must be within {MAX_BYTES:?}")));
        }
        if !TIMEOUT_MS.contains(&self.timeout_ms) {
            return Err(ConfigError::invalid("timeout_ms", format!("must be within {TIMEOUT_MS:?}ms")));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::invalid("user_agent", "must not be empty"));
        }
        if self.cache_cleared_message.trim().is_empty() {
            return Err(ConfigError::invalid("cache_cleared_message", "must not be empty"));
        }

        if self.precache_assets.is_empty() {
            tracing::warn!(version = %self.cache_version, "precache_assets is empty; install only opens the static store");
        }
        let mut seen = HashSet::new();
        for asset in self.precache_assets.iter().filter(|a| !seen.insert(a.as_str())) {
            tracing::warn!(%asset, "precache asset listed more than once");
        }

        Ok(())
    }
}

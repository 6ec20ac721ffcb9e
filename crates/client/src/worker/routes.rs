//! Request classification.
//!
//! [`classify`] is pure: it only looks at the request and the configured
//! routes, so the strategy table can be tested without a store or network.

use pwa_cache_core::{AppConfig, Error, Request};
use url::Url;

use crate::fetch::resolve;

/// How a single intercepted request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    /// Not intercepted; the page talks to the network directly.
    PassThrough,
    /// Static store first, network on miss.
    CacheFirst,
    /// Network first, dynamic store on failure. `offline_document` enables the
    /// root page and 503 fallbacks.
    NetworkFirst { offline_document: bool },
    /// Network first, any store on failure, no further fallback.
    NetworkWithCacheFallback,
}

impl FetchPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchPlan::PassThrough => "pass_through",
            FetchPlan::CacheFirst => "cache_first",
            FetchPlan::NetworkFirst { .. } => "network_first",
            FetchPlan::NetworkWithCacheFallback => "network_with_cache_fallback",
        }
    }
}

/// Resolved asset manifest and dynamic route table.
#[derive(Debug, Clone)]
pub struct Routes {
    assets: Vec<Url>,
    dynamic_prefixes: Vec<String>,
    dynamic_paths: Vec<String>,
    root_page: Url,
}

impl Routes {
    /// Resolve every configured path against the application origin.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let resolve_entry = |entry: &str| resolve(entry, &origin).map_err(|e| Error::InvalidUrl(format!("{entry}: {e}")));

        let assets = config
            .precache_assets
            .iter()
            .map(|entry| resolve_entry(entry.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let root_page = resolve_entry(config.root_page.as_str())?;

        Ok(Self {
            assets,
            dynamic_prefixes: config.dynamic_prefixes.clone(),
            dynamic_paths: config.dynamic_paths.clone(),
            root_page,
        })
    }

    /// Manifest URLs in install order.
    pub fn assets(&self) -> &[Url] {
        &self.assets
    }

    pub fn root_page(&self) -> &Url {
        &self.root_page
    }

    pub fn is_asset(&self, url: &Url) -> bool {
        let mut url = url.clone();
        url.set_fragment(None);
        self.assets.contains(&url)
    }

    pub fn is_dynamic(&self, url: &Url) -> bool {
        let path = url.path();
        self.dynamic_paths.iter().any(|p| p == path) || self.dynamic_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

/// Pick the strategy for `request`.
///
/// Precedence: non-GET, manifest match, document or dynamic route, default.
pub fn classify(routes: &Routes, request: &Request) -> FetchPlan {
    if !request.is_get() {
        return FetchPlan::PassThrough;
    }
    if routes.is_asset(&request.url) {
        return FetchPlan::CacheFirst;
    }
    if request.is_document() || routes.is_dynamic(&request.url) {
        return FetchPlan::NetworkFirst { offline_document: request.is_document() };
    }
    FetchPlan::NetworkWithCacheFallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use pwa_cache_core::Destination;

    fn routes() -> Routes {
        Routes::from_config(&AppConfig::default()).unwrap()
    }

    fn url(path: &str) -> Url {
        Url::parse("http://localhost:8000").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_assets_resolved_in_order() {
        let routes = routes();
        assert_eq!(routes.assets().len(), AppConfig::default().precache_assets.len());
        assert_eq!(routes.assets()[0].as_str(), "http://localhost:8000/");
        assert_eq!(routes.root_page().as_str(), "http://localhost:8000/");
    }

    #[test]
    fn test_non_get_passes_through() {
        let req = Request::new("POST", url("/ticket/create/"), Destination::Document);
        assert_eq!(classify(&routes(), &req), FetchPlan::PassThrough);
    }

    #[test]
    fn test_manifest_asset_is_cache_first() {
        let req = Request::new("GET", url("/static/js/ticket_form.js"), Destination::Script);
        assert_eq!(classify(&routes(), &req), FetchPlan::CacheFirst);
    }

    #[test]
    fn test_manifest_wins_over_document() {
        let req = Request::navigate(url("/"));
        assert_eq!(classify(&routes(), &req), FetchPlan::CacheFirst);
    }

    #[test]
    fn test_manifest_match_ignores_fragment() {
        let req = Request::get(url("/static/manifest.json#v2"));
        assert_eq!(classify(&routes(), &req), FetchPlan::CacheFirst);
    }

    #[test]
    fn test_document_is_network_first_with_offline_fallback() {
        let req = Request::navigate(url("/reports/monthly/"));
        assert_eq!(classify(&routes(), &req), FetchPlan::NetworkFirst { offline_document: true });
    }

    #[test]
    fn test_dynamic_prefix_subresource_is_network_first() {
        let req = Request::get(url("/ticket/12/lines/"));
        assert_eq!(classify(&routes(), &req), FetchPlan::NetworkFirst { offline_document: false });

        let req = Request::get(url("/company/3/"));
        assert_eq!(classify(&routes(), &req), FetchPlan::NetworkFirst { offline_document: false });
    }

    #[test]
    fn test_dashboard_is_exact_match() {
        let req = Request::get(url("/dashboard/"));
        assert_eq!(classify(&routes(), &req), FetchPlan::NetworkFirst { offline_document: false });

        let req = Request::get(url("/dashboard/widgets.json"));
        assert_eq!(classify(&routes(), &req), FetchPlan::NetworkWithCacheFallback);
    }

    #[test]
    fn test_prefix_without_trailing_segment_is_default() {
        let req = Request::get(url("/tickets-archive"));
        assert_eq!(classify(&routes(), &req), FetchPlan::NetworkWithCacheFallback);
    }

    #[test]
    fn test_other_get_is_default() {
        let req = Request::new("GET", url("/static/img/logo.png"), Destination::Image);
        assert_eq!(classify(&routes(), &req), FetchPlan::NetworkWithCacheFallback);
    }

    #[test]
    fn test_from_config_rejects_bad_asset() {
        let config = AppConfig { precache_assets: vec!["ftp://files.example/a".into()], ..Default::default() };
        assert!(matches!(Routes::from_config(&config), Err(Error::InvalidUrl(_))));
    }
}

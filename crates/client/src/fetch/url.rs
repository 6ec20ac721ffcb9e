//! Turning manifest entries, route config and tool input into request URLs.

use pwa_cache_core::Error;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("{input:?}: {reason}")]
    Malformed { input: String, reason: String },
}

impl From<UrlError> for Error {
    fn from(err: UrlError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

/// Resolve `input` against the application origin.
///
/// Root-relative paths join onto `base`; anything else must already be an
/// absolute http(s) URL. The fragment is dropped because it never reaches
/// the server and must not split cache keys. The query is kept.
pub fn resolve(input: &str, base: &Url) -> Result<Url, UrlError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlError::Empty);
    }

    let root_relative = input.starts_with('/') && !input.starts_with("//");
    let parsed = if root_relative { base.join(input) } else { Url::parse(input) };
    let mut url = parsed.map_err(|e| UrlError::Malformed { input: input.to_string(), reason: e.to_string() })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
    }

    url.set_fragment(None);
    Ok(url)
}

//! Request-addressed cache key generation.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the key a stored response is filed under.
///
/// Fragments never reach the network, so they are ignored.
pub fn compute_cache_key(method: &str, url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", &url("https://tickets.example/dashboard/"));
        let hash2 = compute_cache_key("GET", &url("https://tickets.example/dashboard/"));
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_method_case_insensitive() {
        let upper = compute_cache_key("GET", &url("https://tickets.example/"));
        let lower = compute_cache_key("get", &url("https://tickets.example/"));
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_hash_ignores_fragment() {
        let plain = compute_cache_key("GET", &url("https://tickets.example/ticket/4/"));
        let anchored = compute_cache_key("GET", &url("https://tickets.example/ticket/4/#items"));
        assert_eq!(plain, anchored);
    }

    #[test]
    fn test_hash_keeps_query() {
        let page1 = compute_cache_key("GET", &url("https://tickets.example/ticket/?page=1"));
        let page2 = compute_cache_key("GET", &url("https://tickets.example/ticket/?page=2"));
        assert_ne!(page1, page2);
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", &url("https://tickets.example/"));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

//! Request and response snapshots exchanged between pages, the network and the stores.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// What the page intends to do with the response.
///
/// Mirrors the fetch `destination` values the controller cares about;
/// everything it does not distinguish collapses into `Empty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// A top-level or nested page navigation.
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    /// `fetch()`/XHR calls and anything without a declared destination.
    #[default]
    #[serde(other)]
    Empty,
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub url: Url,
    #[serde(default)]
    pub destination: Destination,
}

impl Request {
    pub fn new(method: impl Into<String>, url: Url, destination: Destination) -> Self {
        Self { method: method.into().to_ascii_uppercase(), url, destination }
    }

    /// A GET sub-resource request.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url, Destination::Empty)
    }

    /// A GET page navigation.
    pub fn navigate(url: Url) -> Self {
        Self::new("GET", url, Destination::Document)
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    pub fn is_document(&self) -> bool {
        self.destination == Destination::Document
    }
}

/// A response snapshot. Cloning shares the body buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// Minimal page served to offline navigations when nothing is cached.
    pub fn offline() -> Self {
        Self::new(
            503,
            vec![("content-type".to_string(), "text/plain; charset=utf-8".to_string())],
            Bytes::from_static(b"Offline"),
        )
    }

    /// Only exact 200 responses are written to a store.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

//! Control messages from pages and notices sent back to them.

use serde::{Deserialize, Serialize};

/// Commands a page can post to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    /// Leave the waiting stage now. No reply.
    SkipWaiting,
    /// Delete every store, then notify every connected page.
    ClearCache,
}

impl ControlMessage {
    /// Parse a posted payload. Anything without a known `type` is `None`.
    pub fn parse(payload: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(payload.clone()).ok()
    }
}

/// Notices posted from the worker to pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientNotice {
    CacheCleared { message: String },
}

impl ClientNotice {
    /// `message` comes from `AppConfig::cache_cleared_message`.
    pub fn cache_cleared(message: impl Into<String>) -> Self {
        ClientNotice::CacheCleared { message: message.into() }
    }
}

/// What handling a control message did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    Ignored,
    SkippedWaiting,
    CacheCleared { stores_deleted: usize, pages_notified: usize },
}

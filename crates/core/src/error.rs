//! Error type shared by the stores, the controller and the MCP tools.
//!
//! Every variant renders as `CODE: detail`. [`Error::code`] exposes the
//! code on its own; MCP errors carry it in `data.code`.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller supplied something unusable (bad method, empty field).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Transport failure; HTTP error statuses are responses, not errors.
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Nothing stored under the request's key.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored headers did not decode.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Lifecycle event arrived in a state that cannot accept it.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),
}

impl Error {
    /// The stable code at the front of the display string.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::Network(_) => "NETWORK_ERROR",
            Error::FetchTooLarge(_) => "FETCH_TOO_LARGE",
            Error::CacheMiss(_) => "CACHE_MISS",
            Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptEntry(_) => "CACHE_ERROR",
            Error::InvalidState(_) => "INVALID_STATE",
        }
    }

    fn rpc_code(&self) -> i32 {
        match self {
            Error::InvalidInput(_) => -32602,
            Error::CacheMiss(_) => -32001,
            Error::Database(_) | Error::MigrationFailed(_) | Error::CorruptEntry(_) => -32002,
            Error::InvalidUrl(_) => -32003,
            Error::FetchTooLarge(_) => -32007,
            Error::Network(_) => -32008,
            Error::InvalidState(_) => -32013,
        }
    }

    fn detail(&self) -> String {
        match self {
            Error::Database(e) => e.to_string(),
            Error::InvalidInput(msg)
            | Error::InvalidUrl(msg)
            | Error::Network(msg)
            | Error::FetchTooLarge(msg)
            | Error::CacheMiss(msg)
            | Error::MigrationFailed(msg)
            | Error::CorruptEntry(msg)
            | Error::InvalidState(msg) => msg.clone(),
        }
    }
}

/// Errors returned from inside a `Connection::call` closure come back
/// wrapped; unwrap ours and keep connection failures as `Database`.
impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(inner) => inner,
            tokio_rusqlite::Error::Close(closing) => Error::Database(tokio_rusqlite::Error::Close(closing)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptEntry(err.to_string())
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        McpError {
            code: ErrorCode(err.rpc_code()),
            message: err.detail().into(),
            data: Some(serde_json::json!({ "code": err.code() })),
        }
    }
}

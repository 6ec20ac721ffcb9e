//! Named, versioned response stores.
//!
//! The controller only sees the [`CacheStorage`] trait. Two backends
//! implement it:
//!
//! - [`MemoryStorage`] keeps stores in process memory
//! - [`CacheDb`] persists stores in SQLite via tokio-rusqlite (WAL mode,
//!   versioned migrations, cascading store deletion)

pub mod connection;
pub mod hash;
pub mod migrations;
pub mod storage;
pub mod stores;

pub use crate::Error;

pub use connection::CacheDb;
pub use storage::{CacheStorage, MemoryStorage};

//! Core types and shared functionality for pwa-cache.
//!
//! This crate provides:
//! - Request/response snapshots exchanged with the network and the stores
//! - Named cache stores behind the `CacheStorage` trait (memory and SQLite)
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;

pub use cache::{CacheDb, CacheStorage, MemoryStorage};
pub use config::{AppConfig, ConfigError, Strategy};
pub use error::Error;
pub use request::{Destination, Request, Response};

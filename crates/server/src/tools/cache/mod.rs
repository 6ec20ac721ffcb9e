//! Cache-related MCP tools.
//!
//! This module provides tools for inspecting the worker's cache stores.

pub mod get;
pub mod keys;

pub use get::{CacheGetParams, get_impl};
pub use keys::keys_impl;

//! Client side of pwa-cache.
//!
//! This crate provides the network seam with its reqwest implementation and
//! the offline worker: request classification, lifecycle, the versioned
//! cache controller and its pass-through alternative.

pub mod fetch;
pub mod worker;

pub use fetch::{FetchConfig, HttpNetwork, Network, UrlError, resolve};

pub use worker::{
    ActivateReport, CacheController, ClientNotice, ClientRegistry, ControlMessage, FetchOutcome, FetchPlan,
    InstallReport, MessageOutcome, PassThroughWorker, ResponseSource, Routes, Worker, WorkerState, classify,
};

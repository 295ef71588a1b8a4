//! Core of the tvcache offline cache worker.
//!
//! This crate provides:
//! - Generation store with SQLite backend
//! - Request routing and the cache-first / network-first strategies
//! - The worker lifecycle (install, activate) and control channel
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod network;
pub mod worker;

pub use cache::{CacheDb, Generation};
pub use config::AppConfig;
pub use error::Error;
pub use crate::http::{Destination, Method, Request, Response};
pub use network::{Host, Network};
pub use worker::{Event, EventOutcome, FetchOutcome, ServiceWorker, WorkerState};

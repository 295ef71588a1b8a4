//! Network client for tvcache.
//!
//! This crate provides the HTTP transport the worker forwards requests
//! through, and URL resolution for requests arriving from the host.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, UrlError, resolve};

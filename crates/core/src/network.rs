//! Seams between the worker and its host environment.
//!
//! The worker never talks to sockets or to the page directly: the network is
//! reached through [`Network`], and lifecycle signals (skip-waiting, claim,
//! update-ready) go out through [`Host`].

use async_trait::async_trait;

use crate::Error;
use crate::http::{Request, Response};

/// Transport used for every request the worker forwards.
#[async_trait]
pub trait Network: Send + Sync {
    /// Perform `request` over the network.
    ///
    /// Any response that arrives, including 4xx/5xx, is `Ok`. `Err` means no
    /// response was received (unreachable host, reset, timeout).
    async fn fetch(&self, request: &Request) -> Result<Response, Error>;
}

/// Lifecycle signals the worker sends to the environment hosting it.
#[async_trait]
pub trait Host: Send + Sync {
    /// Make the installed version eligible for activation without waiting
    /// for sessions bound to the previous version to close.
    async fn skip_waiting(&self);

    /// Take control of every open session; returns how many were claimed.
    async fn claim(&self) -> usize;

    /// An installed version is waiting while an older one still controls
    /// clients.
    async fn update_ready(&self, _version: &str) {}
}

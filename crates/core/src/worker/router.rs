//! Request classification.
//!
//! Maps `(method, path, destination)` to a retrieval strategy and the role
//! of the generation it reads and writes. Pure; no I/O.

use serde::{Deserialize, Serialize};

use super::roles::Role;
use crate::http::{Method, Request};

/// Order in which cache and network are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Serve from cache when present; fetch and store otherwise.
    CacheFirst,
    /// Fetch and store; fall back to cache when the network fails.
    NetworkFirst,
}

/// A strategy bound to a generation role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub strategy: Strategy,
    pub role: Role,
}

/// Classify `request`. `None` means the request is not intercepted.
///
/// 1. Non-GET requests pass through.
/// 2. Shell paths (and `/`) are cache-first against the shell generation.
/// 3. Video, audio and images are cache-first against the runtime generation.
/// 4. Everything else is network-first against the runtime generation.
pub fn route(request: &Request, manifest: &[String]) -> Option<Route> {
    if request.method != Method::GET {
        return None;
    }

    let path = request.path();
    let route = if path == "/" || manifest.iter().any(|p| p == path) {
        Route { strategy: Strategy::CacheFirst, role: Role::Shell }
    } else if request.destination.is_media() {
        Route { strategy: Strategy::CacheFirst, role: Role::Runtime }
    } else {
        Route { strategy: Strategy::NetworkFirst, role: Role::Runtime }
    };

    tracing::debug!(url = %request.url, strategy = ?route.strategy, role = %route.role, "routed request");
    Some(route)
}

//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `version` or `cache_prefix` is empty
    /// - `origin` is not an http(s) URL
    /// - a manifest path is not root-relative, carries a query or fragment,
    ///   or names another host; or a seed is not absolute
    /// - `offline_document` is not part of the manifest
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version.trim().is_empty() {
            return Err(invalid("version", "must not be empty"));
        }
        if self.cache_prefix.trim().is_empty() {
            return Err(invalid("cache_prefix", "must not be empty"));
        }

        let origin = match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") => origin,
            Ok(origin) => return Err(invalid("origin", format!("unsupported scheme: {}", origin.scheme()))),
            Err(e) => return Err(invalid("origin", e.to_string())),
        };

        if let Some(path) = self.static_manifest.iter().find(|p| !p.starts_with('/')) {
            return Err(invalid("static_manifest", format!("path must be root-relative: {path}")));
        }

        // Requests match the manifest on URL path alone.
        if let Some(path) = self
            .static_manifest
            .iter()
            .find(|p| !origin.join(p).is_ok_and(|joined| joined.origin() == origin.origin() && joined.path() == p.as_str()))
        {
            return Err(invalid("static_manifest", format!("must be a plain path on the origin: {path}")));
        }

        if let Some(seed) = self.seed_resources.iter().find(|s| url::Url::parse(s).is_err()) {
            return Err(invalid("seed_resources", format!("not an absolute URL: {seed}")));
        }

        if !self.static_manifest.contains(&self.offline_document) {
            return Err(invalid("offline_document", "must be listed in static_manifest"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.seed_resources.is_empty() {
            tracing::debug!("no seed resources configured; runtime generation starts empty");
        }

        Ok(())
    }
}

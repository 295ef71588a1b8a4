//! Worker configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (TVCACHE_*)
//! 2. TOML config file (if TVCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::worker::GenerationNames;

mod validation;

pub use validation::ConfigError;

/// Worker configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (TVCACHE_*)
/// 2. TOML config file (if TVCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
///
/// List values from the environment use figment's array syntax, e.g.
/// `TVCACHE_STATIC_MANIFEST='["/", "/index.html"]'`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via TVCACHE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Deployed version; embedded in every generation name.
    ///
    /// Set via TVCACHE_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// Prefix shared by all generation names of this application.
    ///
    /// Set via TVCACHE_CACHE_PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Origin the root-relative manifest paths are resolved against.
    ///
    /// Set via TVCACHE_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Root-relative paths that make up the application shell.
    #[serde(default = "default_static_manifest")]
    pub static_manifest: Vec<String>,

    /// Absolute URLs prefetched best-effort into the runtime generation.
    #[serde(default = "default_seed_resources")]
    pub seed_resources: Vec<String>,

    /// Shell path served to navigations when both network and cache miss.
    ///
    /// Set via TVCACHE_OFFLINE_DOCUMENT environment variable.
    #[serde(default = "default_offline_document")]
    pub offline_document: String,

    /// User-Agent string for network requests.
    ///
    /// Set via TVCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via TVCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes accepted per response body.
    ///
    /// Set via TVCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./tvcache.sqlite")
}

fn default_version() -> String {
    "v1".into()
}

fn default_cache_prefix() -> String {
    "pwa-tv".into()
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_static_manifest() -> Vec<String> {
    ["/", "/index.html", "/styles.css", "/app.js", "/manifest.json", "/icon-192.png", "/icon-512.png"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_seed_resources() -> Vec<String> {
    [
        "https://sample-videos.com/zip/10/mp4/SampleVideo_1280x720_1mb.mp4",
        "https://www.soundjay.com/misc/sounds/bell-ringing-05.wav",
        "https://picsum.photos/800/600?random=1",
        "https://picsum.photos/800/600?random=2",
        "https://picsum.photos/800/600?random=3",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_offline_document() -> String {
    "/index.html".into()
}

fn default_user_agent() -> String {
    "tvcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    20 * 1024 * 1024 // 20MB, media seeds are large
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            version: default_version(),
            cache_prefix: default_cache_prefix(),
            origin: default_origin(),
            static_manifest: default_static_manifest(),
            seed_resources: default_seed_resources(),
            offline_document: default_offline_document(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Version-qualified generation names for this deployment.
    pub fn generation_names(&self) -> GenerationNames {
        GenerationNames::new(&self.cache_prefix, &self.version)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `TVCACHE_`
    /// 2. TOML file from `TVCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("TVCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("TVCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

//! The offline cache worker.
//!
//! [`ServiceWorker`] is the long-lived state container for one deployed
//! version. The host feeds it a closed set of [`Event`]s through
//! [`ServiceWorker::dispatch`]; the returned future completing is the signal
//! that the lifecycle phase is done.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::Error;
use crate::cache::CacheDb;
use crate::config::AppConfig;
use crate::http::Request;
use crate::network::{Host, Network};

pub mod control;
pub mod manager;
pub mod roles;
pub mod router;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use control::{ControlMessage, Reply};
pub use manager::{ActivationReport, GenerationManager};
pub use roles::{GenerationNames, Role};
pub use router::{Route, Strategy, route};
pub use strategy::{OfflineDocument, Served, Source};

/// Lifecycle state of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this instance never takes control.
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

/// Events the host delivers to the worker.
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Message(Value),
}

/// Result of an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The worker answered the request.
    Respond(Served),
    /// Not intercepted; the host should use its default network handling.
    PassThrough,
}

/// Completion value of [`ServiceWorker::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Installed,
    Activated(ActivationReport),
    Fetched(FetchOutcome),
    Replied(Option<Reply>),
}

/// One deployed version of the offline cache worker.
pub struct ServiceWorker {
    manager: GenerationManager,
    network: Arc<dyn Network>,
    host: Arc<dyn Host>,
    names: GenerationNames,
    origin: url::Url,
    manifest: Vec<String>,
    seeds: Vec<String>,
    offline_document: String,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    claimed: AtomicBool,
}

impl ServiceWorker {
    /// Build the worker for the version described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the configured origin does not parse.
    pub fn new(config: &AppConfig, db: CacheDb, network: Arc<dyn Network>, host: Arc<dyn Host>) -> Result<Self, Error> {
        let origin = url::Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        Ok(Self {
            manager: GenerationManager::new(db, network.clone(), host.clone()),
            network,
            host,
            names: config.generation_names(),
            origin,
            manifest: config.static_manifest.clone(),
            seeds: config.seed_resources.clone(),
            offline_document: config.offline_document.clone(),
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            claimed: AtomicBool::new(false),
        })
    }

    pub fn manager(&self) -> &GenerationManager {
        &self.manager
    }

    pub fn names(&self) -> &GenerationNames {
        &self.names
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn clients_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    /// Resolve a root-relative shell path against the origin.
    pub fn resolve(&self, path: &str) -> Result<url::Url, Error> {
        self.origin.join(path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
    }

    async fn set_state(&self, state: WorkerState) {
        *self.state.write().await = state;
        tracing::info!(version = %self.names.version(), %state, "worker state changed");
    }

    /// Single entry point for every event.
    pub async fn dispatch(&self, event: Event) -> Result<EventOutcome, Error> {
        match event {
            Event::Install => self.on_install().await.map(|()| EventOutcome::Installed),
            Event::Activate => self.on_activate().await.map(EventOutcome::Activated),
            Event::Fetch(request) => Ok(EventOutcome::Fetched(self.on_fetch(&request).await)),
            Event::Message(message) => Ok(EventOutcome::Replied(self.on_message(&message).await)),
        }
    }

    /// Create the current generations and precache the shell.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` once the worker has installed or is
    /// installing; only a fresh or redundant worker installs. A rejected
    /// install leaves the state unchanged.
    pub async fn on_install(&self) -> Result<(), Error> {
        {
            let mut state = self.state.write().await;
            if !matches!(*state, WorkerState::Parsed | WorkerState::Redundant) {
                return Err(Error::InvalidInput(format!("cannot install a worker that is {}", *state)));
            }
            *state = WorkerState::Installing;
        }
        tracing::info!(version = %self.names.version(), state = %WorkerState::Installing, "worker state changed");

        let upgrading = match self.manager.list_generations().await {
            Ok(names) => names.iter().any(|name| !self.names.is_current(name)),
            Err(_) => false,
        };

        let result = self.install_current().await;
        if let Err(e) = result {
            tracing::error!(version = %self.names.version(), error = %e, "install failed");
            self.set_state(WorkerState::Redundant).await;
            return Err(e);
        }

        self.skip_waiting.store(true, Ordering::SeqCst);
        self.set_state(WorkerState::Installed).await;
        if upgrading {
            self.host.update_ready(self.names.version()).await;
        }
        Ok(())
    }

    async fn install_current(&self) -> Result<(), Error> {
        let manifest = self
            .manifest
            .iter()
            .map(|path| self.resolve(path).map(Request::get))
            .collect::<Result<Vec<_>, _>>()?;
        let seeds = self
            .seeds
            .iter()
            .map(|seed| {
                url::Url::parse(seed)
                    .map(Request::get)
                    .map_err(|e| Error::InvalidUrl(format!("{seed}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.manager
            .install(self.names.shell(), &manifest, self.names.runtime(), &seeds)
            .await
    }

    /// Remove stale generations and take control of open sessions.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` unless the worker has installed.
    pub async fn on_activate(&self) -> Result<ActivationReport, Error> {
        let state = self.state().await;
        if !matches!(state, WorkerState::Installed | WorkerState::Activated) {
            return Err(Error::InvalidInput(format!("cannot activate a worker that is {state}")));
        }

        self.set_state(WorkerState::Activating).await;
        let report = match self.manager.activate(&self.names.current()).await {
            Ok(report) => report,
            Err(e) => {
                self.set_state(state).await;
                return Err(e);
            }
        };
        self.claimed.store(true, Ordering::SeqCst);
        self.set_state(WorkerState::Activated).await;
        Ok(report)
    }

    /// Answer an intercepted request, or hand it back to the host.
    pub async fn on_fetch(&self, request: &Request) -> FetchOutcome {
        if self.state().await != WorkerState::Activated {
            return FetchOutcome::PassThrough;
        }
        let Some(route) = route(request, &self.manifest) else {
            return FetchOutcome::PassThrough;
        };

        let generation = match self.manager.ensure_generation(self.names.name(route.role)).await {
            Ok(generation) => generation,
            Err(e) => {
                tracing::error!(role = %route.role, error = %e, "generation unavailable, going to network");
                return FetchOutcome::Respond(match self.network.fetch(request).await {
                    Ok(response) => Served::passthrough(response),
                    Err(_) => Served::offline(),
                });
            }
        };

        let db = self.manager.db();
        let served = match route.strategy {
            Strategy::CacheFirst => strategy::cache_first(db, self.network.as_ref(), request, &generation).await,
            Strategy::NetworkFirst => {
                let shell = self.manager.db().find_generation(self.names.shell()).await.ok().flatten();
                let document = self.resolve(&self.offline_document).ok().map(Request::get);
                let offline = match (&shell, &document) {
                    (Some(generation), Some(request)) => Some(OfflineDocument { generation, request }),
                    _ => None,
                };
                strategy::network_first(db, self.network.as_ref(), request, &generation, offline).await
            }
        };
        FetchOutcome::Respond(served)
    }

    /// Handle a control message; `None` means no reply is sent.
    pub async fn on_message(&self, message: &Value) -> Option<Reply> {
        let command = ControlMessage::parse(message)?;
        tracing::debug!(?command, "control message");
        let reply = control::handle(&self.manager, self.host.as_ref(), command).await;
        if command == ControlMessage::SkipWaiting {
            self.skip_waiting.store(true, Ordering::SeqCst);
        }
        reply
    }
}

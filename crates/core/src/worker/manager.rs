//! Cache generation lifecycle: install, activate, diagnostics and clearing.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::Error;
use crate::cache::{CacheDb, Generation};
use crate::http::{Request, Response};
use crate::network::{Host, Network};

/// What an activation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Stale generations removed.
    pub deleted: Vec<String>,
    /// Stale generations whose deletion failed.
    pub failed: Vec<String>,
    /// Sessions claimed after cleanup.
    pub claimed: usize,
}

/// Owns the set of named generations in the store.
#[derive(Clone)]
pub struct GenerationManager {
    db: CacheDb,
    network: Arc<dyn Network>,
    host: Arc<dyn Host>,
}

async fn fetch_one(network: Arc<dyn Network>, request: Request) -> (Request, Result<Response, Error>) {
    let result = network.fetch(&request).await;
    (request, result)
}

impl GenerationManager {
    pub fn new(db: CacheDb, network: Arc<dyn Network>, host: Arc<dyn Host>) -> Self {
        Self { db, network, host }
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    /// Open or create the named generation.
    pub async fn ensure_generation(&self, name: &str) -> Result<Generation, Error> {
        self.db.ensure_generation(name).await
    }

    /// Create both generations, precache the shell and prefetch seeds.
    ///
    /// Every manifest request must come back with a success status, otherwise
    /// the install fails and no shell entry is written. Seeds are best-effort.
    /// On success the host is told to skip waiting.
    ///
    /// # Errors
    ///
    /// Returns `Error::InstallFailed` naming the first manifest URL that
    /// could not be fetched, or a store error.
    pub async fn install(&self, shell: &str, manifest: &[Request], runtime: &str, seeds: &[Request]) -> Result<(), Error> {
        let shell = self.ensure_generation(shell).await?;
        let runtime = self.ensure_generation(runtime).await?;

        tracing::info!(generation = %shell.name, files = manifest.len(), "caching shell files");
        tracing::info!(generation = %runtime.name, resources = seeds.len(), "caching seed resources");

        let (shell_result, seeded) = tokio::join!(self.precache(&shell, manifest), self.prefetch(&runtime, seeds));
        shell_result?;

        tracing::info!(shell = manifest.len(), seeded, "install complete");
        self.host.skip_waiting().await;
        Ok(())
    }

    async fn precache(&self, generation: &Generation, manifest: &[Request]) -> Result<(), Error> {
        let mut join_set = JoinSet::new();
        for request in manifest {
            join_set.spawn(fetch_one(self.network.clone(), request.clone()));
        }

        let mut fetched = Vec::with_capacity(manifest.len());
        while let Some(joined) = join_set.join_next().await {
            let (request, result) = joined.map_err(|e| Error::Network(format!("fetch task failed: {e}")))?;
            let failure = match result {
                Ok(response) if response.is_success() => {
                    fetched.push((request, response));
                    continue;
                }
                Ok(response) => format!("status {}", response.status),
                Err(e) => e.to_string(),
            };

            join_set.shutdown().await;
            tracing::error!(url = %request.url, reason = %failure, "shell file unavailable, aborting install");
            return Err(Error::InstallFailed { url: request.url.to_string(), reason: failure });
        }

        for (request, response) in &fetched {
            self.db.put_entry(generation, request, response).await?;
        }
        Ok(())
    }

    /// Returns how many seeds were stored.
    async fn prefetch(&self, generation: &Generation, seeds: &[Request]) -> usize {
        let mut join_set = JoinSet::new();
        for request in seeds {
            join_set.spawn(fetch_one(self.network.clone(), request.clone()));
        }

        let mut stored = 0;
        while let Some(joined) = join_set.join_next().await {
            let Ok((request, result)) = joined else {
                continue;
            };
            match result {
                Ok(response) if response.is_success() => {
                    match self.db.put_entry(generation, &request, &response).await {
                        Ok(()) => stored += 1,
                        Err(e) => tracing::warn!(url = %request.url, error = %e, "failed to store seed resource"),
                    }
                }
                Ok(response) => {
                    tracing::warn!(url = %request.url, status = response.status, "skipping seed resource")
                }
                Err(e) => tracing::warn!(url = %request.url, error = %e, "skipping seed resource"),
            }
        }
        stored
    }

    /// Delete every generation not named in `current`, then claim clients.
    ///
    /// Deletions run concurrently and are awaited together; one failing
    /// never stops the others.
    pub async fn activate(&self, current: &[String]) -> Result<ActivationReport, Error> {
        let stale: Vec<String> = self
            .list_generations()
            .await?
            .into_iter()
            .filter(|name| !current.contains(name))
            .collect();

        let mut join_set = JoinSet::new();
        for name in stale {
            let db = self.db.clone();
            join_set.spawn(async move {
                tracing::info!(generation = %name, "removing stale generation");
                let result = db.delete_generation(&name).await;
                (name, result)
            });
        }

        let mut report = ActivationReport::default();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(_))) => report.deleted.push(name),
                Ok((name, Err(e))) => {
                    tracing::warn!(generation = %name, error = %e, "failed to remove stale generation");
                    report.failed.push(name);
                }
                Err(e) => tracing::warn!(error = %e, "stale generation removal task failed"),
            }
        }
        report.deleted.sort();
        report.failed.sort();

        report.claimed = self.host.claim().await;
        tracing::info!(deleted = report.deleted.len(), claimed = report.claimed, "activation complete");
        Ok(report)
    }

    /// Every generation name, oldest first.
    pub async fn list_generations(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .db
            .list_generations()
            .await?
            .into_iter()
            .map(|g| g.name)
            .collect())
    }

    pub async fn entry_count_of(&self, name: &str) -> Result<u64, Error> {
        self.db.entry_count(name).await
    }

    /// Entry count of every generation.
    pub async fn status(&self) -> Result<BTreeMap<String, u64>, Error> {
        let mut status = BTreeMap::new();
        for name in self.list_generations().await? {
            match self.entry_count_of(&name).await {
                Ok(count) => {
                    status.insert(name, count);
                }
                // removed between listing and counting
                Err(Error::GenerationNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(status)
    }

    /// Delete every generation unconditionally.
    pub async fn clear_all(&self) -> Result<u64, Error> {
        let deleted = self.db.clear_generations().await?;
        tracing::info!(deleted, "all generations cleared");
        Ok(deleted)
    }
}

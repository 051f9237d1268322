use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::{stream, StreamExt};
use minetally_api::prelude::*;

use crate::error::Error;

/// Upper bound on share history requests in flight during one cycle.
const MAX_CONCURRENT_FETCHES: usize = 4;

/// Accumulates share history for every worker across poll cycles.
pub struct Aggregator {
    /// The worker and share record, persisted after every cycle.
    pub store: ShareStore,

    /// Where the store is persisted.
    data_path: PathBuf,
}

/// What one poll cycle changed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub workers_found: usize,
    pub new_workers: usize,
    pub workers_updated: usize,
    pub workers_failed: usize,
    pub new_samples: usize,
}

/// Runs poll cycles until the process exits, or once when `once` is set.
/// A failed cycle is logged and the next one runs on schedule.
pub async fn process_polls<S: PoolSource>(
    aggregator: &mut Aggregator,
    source: &S,
    address: &str,
    registry: &WorkerRegistry,
    interval: Duration,
    once: bool,
) -> Result<(), Error> {
    loop {
        match aggregator.cycle(source, address, registry).await {
            Ok(summary) => {
                log::info!(
                    "poll cycle done: {} workers, {} new, {} updated, {} failed, {} new samples",
                    summary.workers_found,
                    summary.new_workers,
                    summary.workers_updated,
                    summary.workers_failed,
                    summary.new_samples
                );
            }
            Err(err) => {
                // in-memory state is kept and the next cycle saves it again
                log::error!("poll cycle failed: {}", err);
                if once {
                    return Err(err);
                }
            }
        }
        if once {
            return Ok(());
        }
        tokio::time::sleep(interval).await;
    }
}

fn log_fetch_error(what: &str, err: &ApiError) {
    if err.is_transient() {
        log::warn!("failed to poll {}, retrying next cycle: {}", what, err);
    } else {
        log::error!("failed to poll {}: {}", what, err);
    }
}

impl Aggregator {
    /// Restores the store from the data file, or starts empty.
    pub fn load(data_path: &Path) -> Result<Self, Error> {
        let state = load_state(data_path)?;
        let store = ShareStore::from(state);
        log::info!(
            "loaded {} workers with {} samples",
            store.workers().len(),
            store.sample_count()
        );
        Ok(Aggregator {
            store,
            data_path: data_path.to_path_buf(),
        })
    }

    /// Discovers workers, merges their share history, then persists.
    /// Fetch failures are logged and skipped. Only a failed save errors.
    pub async fn cycle<S: PoolSource>(
        &mut self,
        source: &S,
        address: &str,
        registry: &WorkerRegistry,
    ) -> Result<CycleSummary, Error> {
        let mut summary = CycleSummary::default();
        let reported = self
            .poll_workers(source, address, registry, &mut summary)
            .await;
        let targets = self.share_targets(&reported);
        self.poll_shares(source, address, targets, &mut summary)
            .await;
        self.save()?;
        Ok(summary)
    }

    async fn poll_workers<S: PoolSource>(
        &mut self,
        source: &S,
        address: &str,
        registry: &WorkerRegistry,
        summary: &mut CycleSummary,
    ) -> Vec<WorkerIdentity> {
        let workers = match source.fetch_workers(address).await {
            Ok(workers) => workers,
            Err(err) => {
                log_fetch_error("workers", &err);
                return vec![];
            }
        };
        log::info!("found {} workers", workers.len());
        summary.workers_found = workers.len();
        for worker in workers.iter() {
            if self.store.register(worker.clone()) {
                summary.new_workers += 1;
                match registry.resolve_owner(&worker.name) {
                    Some(owner) => {
                        log::info!("found new worker! {} owned by {}", worker, owner.name)
                    }
                    None => log::warn!("found new worker! {} has no owner", worker),
                }
            }
        }
        workers
    }

    /// Picks one uid per worker name to receive that name's share history.
    /// The pool's current report wins; otherwise the most recently
    /// registered uid with the name.
    fn share_targets(&self, reported: &[WorkerIdentity]) -> BTreeMap<String, u64> {
        let mut targets = BTreeMap::new();
        for worker in self.store.workers().iter().chain(reported.iter()) {
            targets.insert(worker.name.clone(), worker.uid);
        }
        targets
    }

    async fn poll_shares<S: PoolSource>(
        &mut self,
        source: &S,
        address: &str,
        targets: BTreeMap<String, u64>,
        summary: &mut CycleSummary,
    ) {
        let results: Vec<_> = stream::iter(targets)
            .map(|(name, uid)| async move {
                let result = source.fetch_share_history(address, &name).await;
                (name, uid, result)
            })
            .buffered(MAX_CONCURRENT_FETCHES)
            .collect()
            .await;

        for (name, uid, result) in results {
            match result {
                Ok(samples) => {
                    let fresh = self.unclaimed_samples(&name, uid, samples);
                    let inserted = self.store.merge(uid, &fresh);
                    log::debug!(
                        "updated shares for {} ({}): {} samples, {} new",
                        name,
                        uid,
                        fresh.len(),
                        inserted
                    );
                    summary.workers_updated += 1;
                    summary.new_samples += inserted;
                }
                Err(err) => {
                    log_fetch_error(&format!("shares for worker {} ({})", name, uid), &err);
                    summary.workers_failed += 1;
                }
            }
        }
    }

    /// Drops samples already recorded under another uid with the same name,
    /// so a worker seen under a new uid is not counted twice.
    fn unclaimed_samples(&self, name: &str, uid: u64, samples: Vec<ShareSample>) -> Vec<ShareSample> {
        let siblings: Vec<&ShareSeries> = self
            .store
            .workers()
            .iter()
            .filter(|w| w.name == name && w.uid != uid)
            .filter_map(|w| self.store.series(w.uid))
            .collect();
        samples
            .into_iter()
            .filter(|sample| {
                !siblings
                    .iter()
                    .any(|series| series.contains_key(&sample.timestamp))
            })
            .collect()
    }

    pub fn save(&self) -> Result<(), Error> {
        save_state(&self.store.snapshot(), &self.data_path)?;
        Ok(())
    }
}

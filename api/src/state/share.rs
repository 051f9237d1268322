use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Timestamp, WorkerIdentity};

/// Number of shares a worker had accepted in the interval ending at `timestamp`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShareSample {
    pub timestamp: Timestamp,
    pub shares: u64,
}

impl ShareSample {
    pub fn new(timestamp: Timestamp, shares: u64) -> Self {
        Self { timestamp, shares }
    }
}

impl From<minetally_types::Shares> for ShareSample {
    fn from(shares: minetally_types::Shares) -> Self {
        Self {
            timestamp: shares.date,
            shares: shares.shares,
        }
    }
}

/// timestamp --> share count
pub type ShareSeries = BTreeMap<Timestamp, u64>;

/// worker uid --> share series
pub type WorkerShareSeries = BTreeMap<u64, ShareSeries>;

/// The durable snapshot of a ShareStore.
///
/// Serialized as `{"workers": [{"uid", "id"}], "shares": {"<uid>": {"<ts>": n}}}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PersistedState {
    #[serde(default)]
    pub workers: Vec<WorkerIdentity>,

    #[serde(default)]
    pub shares: WorkerShareSeries,
}

/// Time-series record of share samples per worker.
///
/// Samples are keyed by timestamp within each worker's series, so merging
/// the same poll response any number of times leaves the series unchanged.
/// Workers are never removed once registered.
#[derive(Clone, Debug, Default)]
pub struct ShareStore {
    workers: Vec<WorkerIdentity>,
    shares: WorkerShareSeries,
}

impl ShareStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the worker if its uid has not been seen before.
    /// Returns true when the worker is new.
    pub fn register(&mut self, worker: WorkerIdentity) -> bool {
        if self.workers.iter().any(|w| w.uid == worker.uid) {
            return false;
        }
        self.shares.entry(worker.uid).or_default();
        self.workers.push(worker);
        true
    }

    /// Upserts samples into the worker's series. Last write wins per timestamp.
    /// Returns the number of timestamps that were not in the series before.
    pub fn merge(&mut self, worker_uid: u64, samples: &[ShareSample]) -> usize {
        let series = self.shares.entry(worker_uid).or_default();
        let mut inserted = 0;
        for sample in samples {
            if series.insert(sample.timestamp, sample.shares).is_none() {
                inserted += 1;
            }
        }
        inserted
    }

    /// Sums the worker's samples with `start_exclusive < t <= end_inclusive`.
    pub fn total_shares(
        &self,
        worker_uid: u64,
        start_exclusive: Timestamp,
        end_inclusive: Timestamp,
    ) -> u64 {
        if end_inclusive <= start_exclusive {
            return 0;
        }
        self.shares
            .get(&worker_uid)
            .map(|series| {
                series
                    .range(start_exclusive.saturating_add(1)..=end_inclusive)
                    .map(|(_, shares)| *shares)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Sums every sample the worker has ever reported.
    pub fn all_time_shares(&self, worker_uid: u64) -> u64 {
        self.total_shares(worker_uid, 0, Timestamp::MAX)
    }

    /// Registered workers in discovery order.
    pub fn workers(&self) -> &[WorkerIdentity] {
        &self.workers
    }

    pub fn worker(&self, uid: u64) -> Option<&WorkerIdentity> {
        self.workers.iter().find(|w| w.uid == uid)
    }

    pub fn series(&self, worker_uid: u64) -> Option<&ShareSeries> {
        self.shares.get(&worker_uid)
    }

    /// Number of samples held across all workers.
    pub fn sample_count(&self) -> usize {
        self.shares.values().map(|s| s.len()).sum()
    }

    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            workers: self.workers.clone(),
            shares: self.shares.clone(),
        }
    }

    /// Replaces all in-memory state with the snapshot.
    pub fn restore(&mut self, state: PersistedState) {
        let PersistedState { workers, shares } = state;
        self.workers = Vec::with_capacity(workers.len());
        self.shares = shares;
        for worker in workers {
            self.register(worker);
        }
    }
}

impl From<PersistedState> for ShareStore {
    fn from(state: PersistedState) -> Self {
        let mut store = ShareStore::new();
        store.restore(state);
        store
    }
}

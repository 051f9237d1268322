use serde::{Deserialize, Serialize};

/// Identifies a worker mining for the wallet address.
///
/// The pool assigned `uid` is the stable key. The `name` is the label the
/// miner configured and is what user ownership is declared against.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct WorkerIdentity {
    pub uid: u64,

    /// Persisted as `id`, matching the pool's field name.
    #[serde(rename = "id")]
    pub name: String,
}

impl WorkerIdentity {
    pub fn new(uid: u64, name: impl Into<String>) -> Self {
        Self {
            uid,
            name: name.into(),
        }
    }
}

impl From<minetally_types::Worker> for WorkerIdentity {
    fn from(worker: minetally_types::Worker) -> Self {
        Self {
            uid: worker.uid,
            name: worker.id,
        }
    }
}

impl std::fmt::Display for WorkerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.uid)
    }
}

use std::collections::BTreeMap;

use crate::state::{ShareStore, User, WorkerIdentity};

/// Maps worker names to the users who own them.
///
/// Ownership is declared in config by worker name. When more than one user
/// lists the same worker name the first user in config order owns it.
#[derive(Clone, Debug, Default)]
pub struct WorkerRegistry {
    users: Vec<User>,
}

impl WorkerRegistry {
    pub fn new(users: Vec<User>) -> Self {
        for (i, user) in users.iter().enumerate() {
            for name in user.worker_names.iter() {
                if let Some(first) = users[..i].iter().find(|u| u.owns(name)) {
                    log::warn!(
                        "worker '{}' is claimed by both '{}' and '{}', attributing to '{}'",
                        name,
                        first.name,
                        user.name,
                        first.name
                    );
                }
            }
        }
        Self { users }
    }

    /// Configured users in config order.
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Returns the first user whose ownership list contains the worker name.
    pub fn resolve_owner(&self, worker_name: &str) -> Option<&User> {
        self.users.iter().find(|user| user.owns(worker_name))
    }

    pub fn is_known(&self, worker_name: &str) -> bool {
        self.resolve_owner(worker_name).is_some()
    }

    /// Registered workers no user claims, de-duplicated by uid and sorted by name.
    pub fn unknown_workers<'a>(&self, store: &'a ShareStore) -> Vec<&'a WorkerIdentity> {
        let unknown: BTreeMap<(&str, u64), &WorkerIdentity> = store
            .workers()
            .iter()
            .filter(|worker| !self.is_known(&worker.name))
            .map(|worker| ((worker.name.as_str(), worker.uid), worker))
            .collect();
        unknown.into_values().collect()
    }

    /// Registered workers the user owns, sorted by name then uid.
    pub fn workers_of<'a>(&self, user: &User, store: &'a ShareStore) -> Vec<&'a WorkerIdentity> {
        let mut workers: Vec<&WorkerIdentity> = store
            .workers()
            .iter()
            .filter(|worker| {
                self.resolve_owner(&worker.name)
                    .is_some_and(|owner| owner.name == user.name)
            })
            .collect();
        workers.sort_by(|a, b| (&a.name, a.uid).cmp(&(&b.name, b.uid)));
        workers
    }
}

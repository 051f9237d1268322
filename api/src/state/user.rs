use serde::{Deserialize, Serialize};

/// A person who owns some of the workers mining for the shared address.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub name: String,

    /// Worker names this user owns.
    #[serde(rename = "workers", default)]
    pub worker_names: Vec<String>,
}

impl User {
    pub fn new(name: impl Into<String>, worker_names: &[&str]) -> Self {
        Self {
            name: name.into(),
            worker_names: worker_names.iter().map(|w| w.to_string()).collect(),
        }
    }

    pub fn owns(&self, worker_name: &str) -> bool {
        self.worker_names.iter().any(|w| w == worker_name)
    }
}

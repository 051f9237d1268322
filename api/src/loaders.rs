use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    consts::{CONFIG_FILE_NAME, DATA_FILE_NAME, HOME_DIR_NAME, HOME_ENV_VAR},
    error::ApiError,
    state::{PersistedState, User},
};

/// The wallet being mined for and who owns which workers.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    pub wallet_address: String,

    #[serde(default)]
    pub users: Vec<User>,
}

impl Config {
    pub fn new(wallet_address: impl Into<String>) -> Self {
        Self {
            wallet_address: wallet_address.into(),
            users: Vec::new(),
        }
    }

    fn validate(&self) -> Result<(), ApiError> {
        if self.wallet_address.trim().is_empty() {
            return Err(ApiError::ConfigMalformed(
                "wallet_address is empty".to_string(),
            ));
        }
        for (i, user) in self.users.iter().enumerate() {
            if self.users[..i].iter().any(|u| u.name == user.name) {
                return Err(ApiError::ConfigMalformed(format!(
                    "duplicate user name '{}'",
                    user.name
                )));
            }
        }
        Ok(())
    }
}

/// The directory holding config and data.
/// `MINETALLY_HOME` if set, otherwise `~/.minetally`.
pub fn home_dir() -> Result<PathBuf, ApiError> {
    if let Ok(dir) = std::env::var(HOME_ENV_VAR) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(HOME_DIR_NAME))
        .ok_or(ApiError::HomeDir)
}

pub fn default_config_path() -> Result<PathBuf, ApiError> {
    Ok(home_dir()?.join(CONFIG_FILE_NAME))
}

pub fn default_data_path() -> Result<PathBuf, ApiError> {
    Ok(home_dir()?.join(DATA_FILE_NAME))
}

/// Errors if:
/// - The file does not exist (`ConfigMissing`).
/// - The file cannot be read or parsed (`ConfigMalformed`).
/// - The wallet address is empty or a user name repeats (`ConfigMalformed`).
pub fn load_config(path: &Path) -> Result<Config, ApiError> {
    if !path.exists() {
        return Err(ApiError::ConfigMissing(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path)
        .map_err(|err| ApiError::ConfigMalformed(format!("{}: {}", path.display(), err)))?;
    let config: Config = serde_json::from_str(&contents)
        .map_err(|err| ApiError::ConfigMalformed(format!("{}: {}", path.display(), err)))?;
    config.validate()?;
    log::info!("config loaded from: {}", path.display());
    Ok(config)
}

/// Writes the config, creating the parent directory if needed.
pub fn save_config(config: &Config, path: &Path) -> Result<(), ApiError> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|err| ApiError::Storage(err.to_string()))?;
    write_atomic(path, json.as_bytes())
}

/// Returns an empty state if the file does not exist yet.
pub fn load_state(path: &Path) -> Result<PersistedState, ApiError> {
    if !path.exists() {
        log::info!("data file does not exist: {}", path.display());
        return Ok(PersistedState::default());
    }
    log::info!("reading data file: {}", path.display());
    let contents = fs::read_to_string(path)
        .map_err(|err| ApiError::Storage(format!("{}: {}", path.display(), err)))?;
    let state: PersistedState = serde_json::from_str(&contents)
        .map_err(|err| ApiError::Storage(format!("{}: {}", path.display(), err)))?;
    for uid in state.shares.keys() {
        if !state.workers.iter().any(|w| w.uid == *uid) {
            log::warn!("data file has shares for unregistered worker uid {}", uid);
        }
    }
    Ok(state)
}

/// Overwrites the data file with the full state.
pub fn save_state(state: &PersistedState, path: &Path) -> Result<(), ApiError> {
    let json = serde_json::to_vec(state).map_err(|err| ApiError::Storage(err.to_string()))?;
    write_atomic(path, &json)?;
    log::info!("data saved to {}", path.display());
    Ok(())
}

/// Writes to a sibling temp file then renames it over `path`,
/// so a crash mid-write leaves the previous file intact.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ApiError> {
    let storage_err = |err: std::io::Error| ApiError::Storage(format!("{}: {}", path.display(), err));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(storage_err)?;
    }
    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    let tmp_path = PathBuf::from(tmp_path);

    let mut file = File::create(&tmp_path).map_err(storage_err)?;
    file.write_all(bytes).map_err(storage_err)?;
    file.sync_all().map_err(storage_err)?;
    fs::rename(&tmp_path, path).map_err(storage_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ShareSample, ShareStore, WorkerIdentity};
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tally.json");
        match load_config(&path) {
            Err(ApiError::ConfigMissing(p)) => assert_eq!(p, path),
            other => panic!("expected ConfigMissing, got {:?}", other),
        }
    }

    #[test]
    fn test_load_malformed_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tally.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ApiError::ConfigMalformed(_))
        ));
    }

    #[test]
    fn test_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tally.json");
        fs::write(
            &path,
            r#"{
                "wallet_address": "0x0000000000000000000000000000000000000001",
                "users": [
                    {"name": "alice", "workers": ["DESKTOP-AH56HCB"]},
                    {"name": "bob", "workers": ["LAPTOP-707IIDV9", "rig-2"]}
                ]
            }"#,
        )
        .unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.users.len(), 2);
        assert!(config.users[1].owns("rig-2"));
    }

    #[test]
    fn test_duplicate_user_names_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tally.json");
        let mut config = Config::new("0xabc");
        config.users.push(User::new("alice", &["a"]));
        config.users.push(User::new("alice", &["b"]));
        save_config(&config, &path).unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ApiError::ConfigMalformed(_))
        ));
    }

    #[test]
    fn test_empty_wallet_address_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tally.json");
        save_config(&Config::new("  "), &path).unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ApiError::ConfigMalformed(_))
        ));
    }

    #[test]
    fn test_save_config_creates_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("tally.json");
        let config = Config::new("0xabc");
        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_state_is_empty() {
        let dir = tempdir().unwrap();
        let state = load_state(&dir.path().join("data.json")).unwrap();
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn test_load_malformed_state_is_storage_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(load_state(&path), Err(ApiError::Storage(_))));
    }

    #[test]
    fn test_state_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        let mut store = ShareStore::new();
        store.register(WorkerIdentity::new(1, "rig-a"));
        store.merge(1, &[ShareSample::new(100, 5), ShareSample::new(200, 6)]);
        save_state(&store.snapshot(), &path).unwrap();

        let restored = ShareStore::from(load_state(&path).unwrap());
        assert_eq!(restored.snapshot(), store.snapshot());
        assert_eq!(restored.total_shares(1, 100, 200), 6);
        assert!(!dir.path().join("data.json.tmp").exists());
    }

    #[test]
    fn test_save_state_overwrites_previous() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        let mut store = ShareStore::new();
        store.register(WorkerIdentity::new(1, "rig-a"));
        save_state(&store.snapshot(), &path).unwrap();
        store.register(WorkerIdentity::new(2, "rig-b"));
        save_state(&store.snapshot(), &path).unwrap();

        assert_eq!(load_state(&path).unwrap().workers.len(), 2);
    }
}

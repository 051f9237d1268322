/// Directory under the home directory holding config and data.
pub const HOME_DIR_NAME: &str = ".minetally";

/// Overrides the config/data directory when set.
pub const HOME_ENV_VAR: &str = "MINETALLY_HOME";

/// The config file name.
pub const CONFIG_FILE_NAME: &str = "tally.json";

/// The persisted share data file name.
pub const DATA_FILE_NAME: &str = "data.json";

/// The default pool API base url.
pub const DEFAULT_API_URL: &str = "https://api.nanopool.org/v1/eth";

/// The pool reports roughly the last 10 minutes of share history per call.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;

/// Number of fixed-point units in one whole coin.
pub const AMOUNT_UNITS_PER_COIN: u64 = 1_000_000_000;

/// Digits after the decimal point when displaying an amount.
pub const AMOUNT_DECIMALS: usize = 9;

use serde::{Deserialize, Serialize};

/// Every pool API response wraps its payload in a status envelope.
/// A `status` of false means the pool rejected or could not serve the request.
#[derive(Debug, Deserialize, Serialize)]
pub struct Envelope<T> {
    pub status: bool,

    /// Absent or null when `status` is false.
    pub data: Option<T>,

    /// Human readable reason, only sent alongside `status: false`.
    pub error: Option<String>,
}

/// The response from the /workers request.
pub type WorkersResponse = Envelope<Vec<Worker>>;

/// The response from the /shareratehistory request.
pub type SharesResponse = Envelope<Vec<Shares>>;

/// The response from the /balance request.
pub type BalanceResponse = Envelope<f64>;

/// The response from the /payments request.
pub type PaymentsResponse = Envelope<Vec<Payment>>;

/// A worker mining for the wallet address.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Worker {
    /// Stable id assigned by the pool.
    pub uid: u64,

    /// The worker name chosen by the miner.
    pub id: String,

    #[serde(default)]
    pub hashrate: f64,

    // unix timestamp of the last accepted share
    #[serde(default)]
    pub last_share: u64,

    #[serde(default)]
    pub rating: u64,
}

/// One sample of a worker's share-rate history.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Shares {
    /// Unix timestamp of the sample.
    pub date: u64,

    /// Shares accepted during the sample interval.
    pub shares: u64,
}

/// A payout sent by the pool to the wallet address.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub date: u64,

    #[serde(default)]
    pub tx_hash: String,

    /// Amount in whole coins.
    pub amount: f64,

    pub confirmed: bool,
}

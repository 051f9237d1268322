use crate::state::{Amount, Payment, Timestamp};

/// The window of share activity a single payment pays for.
///
/// Covers `(start_exclusive, end_inclusive]`. Tranches built from one payment
/// history are contiguous and never overlap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tranche {
    pub start_exclusive: Timestamp,
    pub end_inclusive: Timestamp,
    pub amount: Amount,
    pub confirmed: bool,
    pub tx_hash: String,
}

impl Tranche {
    pub fn new(start_exclusive: Timestamp, end_inclusive: Timestamp, amount: Amount) -> Self {
        Self {
            start_exclusive,
            end_inclusive,
            amount,
            confirmed: true,
            tx_hash: String::new(),
        }
    }

    /// True when the window contains no timestamps.
    pub fn is_empty(&self) -> bool {
        self.end_inclusive <= self.start_exclusive
    }
}

/// Partitions `(0, last payment]` into one tranche per payment.
///
/// Payments are sorted by timestamp first; the pool's ordering is not trusted.
/// Unconfirmed payments are kept. Two payments at the same timestamp produce
/// a zero-width tranche for the second.
pub fn build_tranches(payments: &[Payment]) -> Vec<Tranche> {
    let mut sorted: Vec<&Payment> = payments.iter().collect();
    sorted.sort_by_key(|p| p.timestamp);

    let mut last_time: Timestamp = 0;
    let mut tranches = Vec::with_capacity(sorted.len());
    for payment in sorted {
        tranches.push(Tranche {
            start_exclusive: last_time,
            end_inclusive: payment.timestamp,
            amount: payment.amount,
            confirmed: payment.confirmed,
            tx_hash: payment.tx_hash.clone(),
        });
        last_time = payment.timestamp;
    }
    tranches
}

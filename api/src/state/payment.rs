use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use super::Timestamp;
use crate::consts::{AMOUNT_DECIMALS, AMOUNT_UNITS_PER_COIN};
use crate::error::ApiError;

/// A currency amount in fixed-point units of 1e-9 coin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub const fn from_units(units: u64) -> Self {
        Amount(units)
    }

    pub const fn units(self) -> u64 {
        self.0
    }

    /// Converts a whole-coin float as reported by the pool.
    /// Returns None for negative, non-finite, or out of range values.
    pub fn from_coins(coins: f64) -> Option<Self> {
        if !coins.is_finite() || coins < 0.0 {
            return None;
        }
        let units = (coins * AMOUNT_UNITS_PER_COIN as f64).round();
        if units > u64::MAX as f64 {
            return None;
        }
        Some(Amount(units as u64))
    }

    /// Lossy conversion back to whole coins, for display only.
    pub fn as_coins(self) -> f64 {
        self.0 as f64 / AMOUNT_UNITS_PER_COIN as f64
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / AMOUNT_UNITS_PER_COIN;
        let frac = self.0 % AMOUNT_UNITS_PER_COIN;
        write!(f, "{}.{:0width$}", whole, frac, width = AMOUNT_DECIMALS)
    }
}

/// A payout sent by the pool to the shared wallet address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payment {
    pub timestamp: Timestamp,
    pub amount: Amount,
    pub confirmed: bool,
    pub tx_hash: String,
}

impl Payment {
    pub fn new(timestamp: Timestamp, amount: Amount, confirmed: bool) -> Self {
        Self {
            timestamp,
            amount,
            confirmed,
            tx_hash: String::new(),
        }
    }
}

impl TryFrom<minetally_types::Payment> for Payment {
    type Error = ApiError;

    fn try_from(payment: minetally_types::Payment) -> Result<Self, Self::Error> {
        let amount = Amount::from_coins(payment.amount).ok_or_else(|| {
            ApiError::TransientFetch(format!(
                "invalid payment amount {} at {}",
                payment.amount, payment.date
            ))
        })?;
        Ok(Payment {
            timestamp: payment.date,
            amount,
            confirmed: payment.confirmed,
            tx_hash: payment.tx_hash,
        })
    }
}

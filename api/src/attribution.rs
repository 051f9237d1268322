use std::collections::BTreeMap;

use crate::{
    registry::WorkerRegistry,
    state::{Amount, ShareStore},
    tranche::Tranche,
};

/// How a tranche's amount was divided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Split {
    /// Paid out in proportion to shares observed in the window.
    Proportional,

    /// No shares were observed in the window, so the amount was divided
    /// equally across all configured users. This assumes idle windows mean
    /// equal contribution, which is a policy choice and not a measurement.
    EqualFallback,

    /// No shares were observed and no users are configured.
    Unattributed,
}

/// A user's slice of a single tranche.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserPayout {
    pub name: String,
    pub shares: u64,
    pub payout: Amount,
}

/// The result of attributing one tranche.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrancheAttribution {
    pub tranche: Tranche,

    /// Shares of every registered worker in the window, owned or not.
    pub total_shares: u64,

    /// Shares from workers no user claims.
    pub unattributed_shares: u64,

    /// The part of the amount earned by unclaimed workers.
    pub unattributed_payout: Amount,

    /// Every configured user, sorted by name.
    pub users: Vec<UserPayout>,

    pub split: Split,
}

impl TrancheAttribution {
    pub fn attributed_shares(&self) -> u64 {
        self.total_shares - self.unattributed_shares
    }

    pub fn is_fallback(&self) -> bool {
        self.split != Split::Proportional
    }

    pub fn user(&self, name: &str) -> Option<&UserPayout> {
        self.users.iter().find(|u| u.name == name)
    }
}

/// Attributes payments to users in proportion to their workers' shares.
pub struct AttributionEngine<'a> {
    registry: &'a WorkerRegistry,
    store: &'a ShareStore,
}

impl<'a> AttributionEngine<'a> {
    pub fn new(registry: &'a WorkerRegistry, store: &'a ShareStore) -> Self {
        Self { registry, store }
    }

    pub fn attribute_all(&self, tranches: &[Tranche]) -> Vec<TrancheAttribution> {
        tranches.iter().map(|t| self.attribute(t)).collect()
    }

    pub fn attribute(&self, tranche: &Tranche) -> TrancheAttribution {
        // sum shares for each user in the window
        let mut user_shares: BTreeMap<&str, u64> = self
            .registry
            .users()
            .iter()
            .map(|user| (user.name.as_str(), 0))
            .collect();
        let mut total_shares: u64 = 0;
        let mut unattributed_shares: u64 = 0;
        for worker in self.store.workers() {
            let shares = self.store.total_shares(
                worker.uid,
                tranche.start_exclusive,
                tranche.end_inclusive,
            );
            total_shares = total_shares.saturating_add(shares);
            match self.registry.resolve_owner(&worker.name) {
                Some(owner) => {
                    if let Some(sum) = user_shares.get_mut(owner.name.as_str()) {
                        *sum = sum.saturating_add(shares);
                    }
                }
                None => {
                    unattributed_shares = unattributed_shares.saturating_add(shares);
                }
            }
        }

        // split the amount
        let names: Vec<&str> = user_shares.keys().copied().collect();
        let (split, payouts, unattributed_payout) = if total_shares > 0 {
            let mut weights: Vec<u64> = user_shares.values().copied().collect();
            weights.push(unattributed_shares);
            let mut payouts = allocate(tranche.amount, &weights);
            let unattributed_payout = payouts.pop().unwrap_or(Amount::ZERO);
            (Split::Proportional, payouts, unattributed_payout)
        } else if !names.is_empty() {
            if tranche.is_empty() {
                log::debug!(
                    "zero-width window at {}, splitting {} equally",
                    tranche.end_inclusive,
                    tranche.amount
                );
            } else {
                log::debug!(
                    "no shares recorded in ({}, {}], splitting {} equally",
                    tranche.start_exclusive,
                    tranche.end_inclusive,
                    tranche.amount
                );
            }
            let weights = vec![1; names.len()];
            (
                Split::EqualFallback,
                allocate(tranche.amount, &weights),
                Amount::ZERO,
            )
        } else {
            (Split::Unattributed, Vec::new(), tranche.amount)
        };

        let users = names
            .iter()
            .zip(payouts)
            .map(|(name, payout)| UserPayout {
                name: name.to_string(),
                shares: user_shares[name],
                payout,
            })
            .collect();

        TrancheAttribution {
            tranche: tranche.clone(),
            total_shares,
            unattributed_shares,
            unattributed_payout,
            users,
            split,
        }
    }
}

/// Sums each user's payouts across tranches.
pub fn user_totals(attributions: &[TrancheAttribution]) -> BTreeMap<String, Amount> {
    let mut totals: BTreeMap<String, Amount> = BTreeMap::new();
    for attribution in attributions {
        for user in attribution.users.iter() {
            let total = totals.entry(user.name.clone()).or_default();
            *total = *total + user.payout;
        }
    }
    totals
}

/// Divides `amount` across `weights` with the largest-remainder method.
///
/// Each part gets the floor of its exact share, then the leftover units go
/// one each to the parts with the largest remainders, earlier parts first on
/// ties. The parts always sum to `amount` unless every weight is zero, in
/// which case every part is zero.
pub fn allocate(amount: Amount, weights: &[u64]) -> Vec<Amount> {
    let total: u128 = weights.iter().map(|w| *w as u128).sum();
    if total == 0 {
        return vec![Amount::ZERO; weights.len()];
    }
    let units = amount.units() as u128;

    let mut parts: Vec<u128> = Vec::with_capacity(weights.len());
    let mut remainders: Vec<(u128, usize)> = Vec::with_capacity(weights.len());
    for (i, weight) in weights.iter().enumerate() {
        let exact = units * *weight as u128;
        parts.push(exact / total);
        remainders.push((exact % total, i));
    }

    let assigned: u128 = parts.iter().sum();
    let leftover = (units - assigned) as usize;
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for (_, i) in remainders.into_iter().take(leftover) {
        parts[i] += 1;
    }

    // every part is at most `units`, which came from a u64
    parts
        .into_iter()
        .map(|p| Amount::from_units(p as u64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Payment, ShareSample, User, WorkerIdentity};
    use crate::tranche::build_tranches;

    fn coins(c: f64) -> Amount {
        Amount::from_coins(c).unwrap()
    }

    fn setup(users: Vec<User>, workers: &[(u64, &str, Vec<(u64, u64)>)]) -> (WorkerRegistry, ShareStore) {
        let registry = WorkerRegistry::new(users);
        let mut store = ShareStore::new();
        for (uid, name, samples) in workers {
            store.register(WorkerIdentity::new(*uid, *name));
            let samples: Vec<ShareSample> =
                samples.iter().map(|(t, s)| ShareSample::new(*t, *s)).collect();
            store.merge(*uid, &samples);
        }
        (registry, store)
    }

    fn three_users() -> Vec<User> {
        vec![
            User::new("alice", &["rig-a"]),
            User::new("bob", &["rig-b"]),
            User::new("carol", &["rig-c"]),
        ]
    }

    #[test]
    fn test_proportional_split_sums_to_total() {
        let (registry, store) = setup(
            three_users(),
            &[
                (1, "rig-a", vec![(10, 20), (20, 30)]),
                (2, "rig-b", vec![(15, 30)]),
                (3, "rig-c", vec![(30, 20)]),
            ],
        );
        let engine = AttributionEngine::new(&registry, &store);
        let result = engine.attribute(&Tranche::new(0, 100, coins(10.0)));

        assert_eq!(result.split, Split::Proportional);
        assert!(!result.is_fallback());
        assert_eq!(result.total_shares, 100);
        assert_eq!(result.user("alice").unwrap().shares, 50);
        assert_eq!(result.user("alice").unwrap().payout, coins(5.0));
        assert_eq!(result.user("bob").unwrap().payout, coins(3.0));
        assert_eq!(result.user("carol").unwrap().payout, coins(2.0));
        let sum: Amount = result.users.iter().map(|u| u.payout).sum();
        assert_eq!(sum, coins(10.0));
        assert_eq!(result.unattributed_payout, Amount::ZERO);
    }

    #[test]
    fn test_zero_shares_fall_back_to_equal_split() {
        let (registry, store) = setup(
            vec![User::new("alice", &["rig-a"]), User::new("bob", &["rig-b"])],
            &[(1, "rig-a", vec![(500, 10)])],
        );
        let engine = AttributionEngine::new(&registry, &store);
        let result = engine.attribute(&Tranche::new(0, 100, coins(3.0)));

        assert_eq!(result.split, Split::EqualFallback);
        assert!(result.is_fallback());
        assert_eq!(result.total_shares, 0);
        assert_eq!(result.user("alice").unwrap().payout, coins(1.5));
        assert_eq!(result.user("bob").unwrap().payout, coins(1.5));
    }

    #[test]
    fn test_zero_shares_and_no_users_is_unattributed() {
        let (registry, store) = setup(vec![], &[]);
        let engine = AttributionEngine::new(&registry, &store);
        let result = engine.attribute(&Tranche::new(0, 100, coins(1.0)));

        assert_eq!(result.split, Split::Unattributed);
        assert!(result.users.is_empty());
        assert_eq!(result.unattributed_payout, coins(1.0));
    }

    #[test]
    fn test_unattributed_shares_are_surfaced() {
        let (registry, store) = setup(
            vec![User::new("alice", &["rig-a"]), User::new("bob", &["rig-b"])],
            &[
                (1, "rig-a", vec![(10, 60)]),
                (2, "rig-b", vec![(10, 20)]),
                (3, "mystery", vec![(10, 20)]),
            ],
        );
        let engine = AttributionEngine::new(&registry, &store);
        let result = engine.attribute(&Tranche::new(0, 100, coins(10.0)));

        let user_sum: u64 = result.users.iter().map(|u| u.shares).sum();
        assert_eq!(result.total_shares, 100);
        assert_eq!(result.unattributed_shares, 20);
        assert_eq!(result.unattributed_shares, result.total_shares - user_sum);
        assert_eq!(result.attributed_shares(), 80);
        assert_eq!(result.user("alice").unwrap().payout, coins(6.0));
        assert_eq!(result.user("bob").unwrap().payout, coins(2.0));
        assert_eq!(result.unattributed_payout, coins(2.0));
    }

    #[test]
    fn test_empty_tranche_counts_no_shares() {
        let (registry, store) = setup(
            vec![User::new("alice", &["rig-a"])],
            &[(1, "rig-a", vec![(100, 5)])],
        );
        let engine = AttributionEngine::new(&registry, &store);
        let result = engine.attribute(&Tranche::new(100, 100, coins(1.0)));
        assert_eq!(result.total_shares, 0);
        assert_eq!(result.split, Split::EqualFallback);
    }

    #[test]
    fn test_rounding_keeps_total_exact() {
        let (registry, store) = setup(
            three_users(),
            &[
                (1, "rig-a", vec![(10, 1)]),
                (2, "rig-b", vec![(10, 1)]),
                (3, "rig-c", vec![(10, 1)]),
            ],
        );
        let engine = AttributionEngine::new(&registry, &store);
        let result = engine.attribute(&Tranche::new(0, 100, Amount::from_units(100)));
        let payouts: Vec<u64> = result.users.iter().map(|u| u.payout.units()).collect();
        // the odd unit goes to the first user by name
        assert_eq!(payouts, vec![34, 33, 33]);
    }

    #[test]
    fn test_attribute_payment_history() {
        let (registry, store) = setup(
            vec![User::new("alice", &["rig-a"]), User::new("bob", &["rig-b"])],
            &[
                (1, "rig-a", vec![(50, 10), (150, 10), (300, 0)]),
                (2, "rig-b", vec![(50, 10), (300, 30)]),
            ],
        );
        let payments = vec![
            Payment::new(100, coins(2.0), true),
            Payment::new(250, coins(1.0), true),
            Payment::new(400, coins(4.0), false),
        ];
        let engine = AttributionEngine::new(&registry, &store);
        let results = engine.attribute_all(&build_tranches(&payments));

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].user("alice").unwrap().payout, coins(1.0));
        assert_eq!(results[1].user("alice").unwrap().payout, coins(1.0));
        assert_eq!(results[1].user("bob").unwrap().payout, Amount::ZERO);
        assert_eq!(results[2].user("bob").unwrap().payout, coins(4.0));

        let totals = user_totals(&results);
        assert_eq!(totals["alice"], coins(2.0));
        assert_eq!(totals["bob"], coins(5.0));
    }

    #[test]
    fn test_allocate_all_zero_weights() {
        assert_eq!(
            allocate(Amount::from_units(10), &[0, 0]),
            vec![Amount::ZERO, Amount::ZERO]
        );
        assert!(allocate(Amount::from_units(10), &[]).is_empty());
    }

    #[test]
    fn test_allocate_large_values_do_not_overflow() {
        let parts = allocate(Amount::from_units(u64::MAX), &[u64::MAX, u64::MAX]);
        let sum: u128 = parts.iter().map(|p| p.units() as u128).sum();
        assert_eq!(sum, u64::MAX as u128);
    }
}

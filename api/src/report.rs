use std::fmt::Write;

use chrono::DateTime;

use crate::{
    attribution::{user_totals, Split, TrancheAttribution},
    registry::WorkerRegistry,
    state::{Amount, ShareStore, Timestamp},
};

const RULE: &str = "----------------------------------------";

/// Renders registry and attribution results as plain text.
///
/// All sections are sorted (users by name, workers by name then uid) so
/// the same inputs always render the same text.
pub struct ReportPresenter<'a> {
    registry: &'a WorkerRegistry,
    store: &'a ShareStore,
}

impl<'a> ReportPresenter<'a> {
    pub fn new(registry: &'a WorkerRegistry, store: &'a ShareStore) -> Self {
        Self { registry, store }
    }

    pub fn header(&self, address: &str, balance: Option<Amount>) -> String {
        let mut out = String::new();
        writeln!(out, "MINETALLY REPORT").ok();
        writeln!(out, "{}", RULE).ok();
        writeln!(out, "Address:  {}", address).ok();
        if let Some(balance) = balance {
            writeln!(out, "Balance:  {}", balance).ok();
        }
        writeln!(out, "Users:    {}", self.registry.user_count()).ok();
        writeln!(out, "Workers:  {}", self.store.workers().len()).ok();
        writeln!(out, "Samples:  {}", self.store.sample_count()).ok();
        out
    }

    /// Each user's workers and all-time share totals.
    pub fn known_users(&self) -> String {
        let grand_total: u64 = self
            .store
            .workers()
            .iter()
            .map(|w| self.store.all_time_shares(w.uid))
            .sum();

        let mut users: Vec<_> = self.registry.users().iter().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));

        let mut out = String::new();
        writeln!(out, "Known Users").ok();
        writeln!(out, "{}", RULE).ok();
        if users.is_empty() {
            writeln!(out, "  NONE").ok();
        }
        for user in users {
            writeln!(out, "{}", user.name).ok();
            let workers = self.registry.workers_of(user, self.store);
            let mut total: u64 = 0;
            for worker in workers.iter() {
                let shares = self.store.all_time_shares(worker.uid);
                total += shares;
                writeln!(out, "  {:<24} {:>12}", worker.to_string(), shares).ok();
            }
            let mut missing: Vec<&String> = user
                .worker_names
                .iter()
                .filter(|name| !workers.iter().any(|w| &&w.name == name))
                .collect();
            missing.sort();
            missing.dedup();
            for name in missing {
                let seen = self.store.workers().iter().any(|w| &w.name == name);
                match self.registry.resolve_owner(name) {
                    Some(owner) if seen => {
                        writeln!(out, "  {:<24} claimed by {}", name, owner.name).ok();
                    }
                    _ => {
                        writeln!(out, "  {:<24} {:>12}", name, "not seen").ok();
                    }
                }
            }
            writeln!(
                out,
                "  {:<24} {:>12} ({})",
                "total",
                total,
                percent(total, grand_total)
            )
            .ok();
        }
        out
    }

    /// Workers no user claims, listed once each.
    pub fn unknown_workers(&self) -> String {
        let mut out = String::new();
        writeln!(out, "Unknown Workers").ok();
        writeln!(out, "{}", RULE).ok();
        let unknown = self.registry.unknown_workers(self.store);
        if unknown.is_empty() {
            writeln!(out, "  NONE").ok();
        }
        for worker in unknown {
            writeln!(
                out,
                "  {:<24} {:>12}",
                worker.to_string(),
                self.store.all_time_shares(worker.uid)
            )
            .ok();
        }
        out
    }

    /// One block per payment with each user's shares and payout.
    pub fn tranches(&self, attributions: &[TrancheAttribution]) -> String {
        let mut out = String::new();
        writeln!(out, "Payments").ok();
        writeln!(out, "{}", RULE).ok();
        if attributions.is_empty() {
            writeln!(out, "  NONE").ok();
            return out;
        }
        for attribution in attributions {
            let tranche = &attribution.tranche;
            let status = if tranche.confirmed { "" } else { " (unconfirmed)" };
            writeln!(
                out,
                "{}  amount {}{}",
                format_time(tranche.end_inclusive),
                tranche.amount,
                status
            )
            .ok();
            writeln!(
                out,
                "  window ({}, {}]  shares {}  attributed {}",
                tranche.start_exclusive,
                tranche.end_inclusive,
                attribution.total_shares,
                attribution.attributed_shares()
            )
            .ok();
            match attribution.split {
                Split::Proportional => {
                    for user in attribution.users.iter() {
                        writeln!(
                            out,
                            "  {:<16} {:>12} {:>9} -> {}",
                            user.name,
                            user.shares,
                            percent(user.shares, attribution.total_shares),
                            user.payout
                        )
                        .ok();
                    }
                    if attribution.unattributed_shares > 0 {
                        writeln!(
                            out,
                            "  {:<16} {:>12} {:>9} -> {}",
                            "unattributed",
                            attribution.unattributed_shares,
                            percent(attribution.unattributed_shares, attribution.total_shares),
                            attribution.unattributed_payout
                        )
                        .ok();
                    }
                }
                Split::EqualFallback => {
                    writeln!(
                        out,
                        "  no shares recorded in window, equal split across {} users",
                        attribution.users.len()
                    )
                    .ok();
                    for user in attribution.users.iter() {
                        writeln!(out, "  {:<16} -> {}", user.name, user.payout).ok();
                    }
                }
                Split::Unattributed => {
                    writeln!(
                        out,
                        "  no shares recorded and no users configured, {} unattributed",
                        attribution.unattributed_payout
                    )
                    .ok();
                }
            }
        }
        out
    }

    /// Each user's payouts summed over every payment.
    pub fn totals(&self, attributions: &[TrancheAttribution]) -> String {
        let mut out = String::new();
        writeln!(out, "Totals").ok();
        writeln!(out, "{}", RULE).ok();
        let totals = user_totals(attributions);
        if totals.is_empty() {
            writeln!(out, "  NONE").ok();
        }
        for (name, amount) in totals {
            writeln!(out, "  {:<16} {}", name, amount).ok();
        }
        let unattributed: Amount = attributions.iter().map(|a| a.unattributed_payout).sum();
        if unattributed > Amount::ZERO {
            writeln!(out, "  {:<16} {}", "unattributed", unattributed).ok();
        }
        out
    }

    /// Header, known users, unknown workers, payments, and totals.
    pub fn render(
        &self,
        address: &str,
        balance: Option<Amount>,
        attributions: &[TrancheAttribution],
    ) -> String {
        [
            self.header(address, balance),
            self.known_users(),
            self.unknown_workers(),
            self.tranches(attributions),
            self.totals(attributions),
        ]
        .join("\n")
    }
}

fn percent(part: u64, whole: u64) -> String {
    if whole == 0 {
        return "-".to_string();
    }
    format!("{:.2}%", part as f64 / whole as f64 * 100.0)
}

fn format_time(timestamp: Timestamp) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

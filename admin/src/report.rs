use std::path::Path;

use minetally_api::prelude::*;

use crate::error::Error;

/// Attributes every payment in the pool's history to users and renders the report.
pub async fn report<S: PoolSource>(
    source: &S,
    config: &Config,
    data_path: &Path,
    confirmed_only: bool,
) -> Result<String, Error> {
    let store = ShareStore::from(load_state(data_path)?);
    let registry = WorkerRegistry::new(config.users.clone());
    let address = config.wallet_address.as_str();

    let mut payments = source.fetch_payments(address).await?;
    if confirmed_only {
        payments.retain(|p| p.confirmed);
    }
    let balance = match source.fetch_balance(address).await {
        Ok(balance) => Some(balance),
        Err(err) => {
            log::warn!("failed to fetch wallet balance: {}", err);
            None
        }
    };

    let tranches = build_tranches(&payments);
    let attributions = AttributionEngine::new(&registry, &store).attribute_all(&tranches);
    let fallbacks = attributions.iter().filter(|a| a.is_fallback()).count();
    if fallbacks > 0 {
        log::warn!(
            "{} of {} payments had no recorded shares and were not split by contribution",
            fallbacks,
            attributions.len()
        );
    }
    let presenter = ReportPresenter::new(&registry, &store);
    Ok(presenter.render(address, balance, &attributions))
}

/// Known users and unknown workers from the local data only.
pub fn workers(config: &Config, data_path: &Path) -> Result<String, Error> {
    let store = ShareStore::from(load_state(data_path)?);
    let registry = WorkerRegistry::new(config.users.clone());
    let presenter = ReportPresenter::new(&registry, &store);
    Ok(format!(
        "{}\n{}",
        presenter.known_users(),
        presenter.unknown_workers()
    ))
}

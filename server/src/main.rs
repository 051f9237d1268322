mod aggregator;
mod error;
mod operator;

use std::{path::PathBuf, time::Duration};

use aggregator::{process_polls, Aggregator};
use clap::Parser;
use minetally_api::consts::{DEFAULT_API_URL, DEFAULT_POLL_INTERVAL_SECS};
use operator::Operator;

/// Polls the pool for per-worker share history and records it to disk.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file [default: ~/.minetally/tally.json]
    #[arg(short, long, env = "MINETALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the share data file [default: ~/.minetally/data.json]
    #[arg(long, env = "MINETALLY_DATA")]
    data: Option<PathBuf>,

    /// Seconds to wait between poll cycles
    #[arg(short, long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    interval: u64,

    /// Pool api base url
    #[arg(long, env = "MINETALLY_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), error::Error> {
    let args = Args::parse();
    let level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let operator = Operator::new(args.config, args.data, &args.api_url)?;
    log::info!("minetally starting, monitoring address {}", operator.address);
    log::info!(
        "users: {}",
        operator
            .registry
            .users()
            .iter()
            .map(|u| u.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    log::info!("poll interval: {}s", args.interval);
    match operator.get_balance().await {
        Ok(balance) => log::info!("wallet balance: {}", balance),
        Err(err) => log::warn!("failed to fetch wallet balance: {}", err),
    }

    let mut aggregator = Aggregator::load(&operator.data_path)?;
    process_polls(
        &mut aggregator,
        &operator.client,
        &operator.address,
        &operator.registry,
        Duration::from_secs(args.interval),
        args.once,
    )
    .await
}

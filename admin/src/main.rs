use std::path::PathBuf;

use clap::{Parser, Subcommand};
use minetally_api::prelude::*;

mod error;
mod init;
mod report;

/// Operator tools for the share tally
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file [default: ~/.minetally/tally.json]
    #[arg(short, long, global = true, env = "MINETALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the share data file [default: ~/.minetally/data.json]
    #[arg(long, global = true, env = "MINETALLY_DATA")]
    data: Option<PathBuf>,

    /// Pool api base url
    #[arg(long, global = true, env = "MINETALLY_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a config file interactively
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
    /// Attribute every payment to users by share contribution
    Report {
        /// Leave out payments the pool has not confirmed
        #[arg(long)]
        confirmed_only: bool,
    },
    /// Print the wallet balance
    Balance,
    /// List known users and unknown workers from local data
    Workers,
}

#[tokio::main]
async fn main() -> Result<(), error::Error> {
    let args = Args::parse();
    let level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let data_path = match args.data {
        Some(path) => path,
        None => default_data_path()?,
    };

    match args.command {
        Command::Init { force } => {
            let stdin = std::io::stdin();
            init::init(&config_path, force, &mut stdin.lock(), &mut std::io::stdout())?;
        }
        Command::Report { confirmed_only } => {
            let config = load_config(&config_path)?;
            let client = NanopoolClient::new(&args.api_url)?;
            let text = report::report(&client, &config, &data_path, confirmed_only).await?;
            println!("{}", text);
        }
        Command::Balance => {
            let config = load_config(&config_path)?;
            let client = NanopoolClient::new(&args.api_url)?;
            let balance = client.fetch_balance(&config.wallet_address).await?;
            println!("{}: {}", config.wallet_address, balance);
        }
        Command::Workers => {
            let config = load_config(&config_path)?;
            println!("{}", report::workers(&config, &data_path)?);
        }
    }
    Ok(())
}

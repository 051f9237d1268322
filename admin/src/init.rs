use std::io::{BufRead, Write};
use std::path::Path;

use minetally_api::loaders::{save_config, Config};

use crate::error::Error;

/// Prompts for the wallet address and writes a config with no users.
pub fn init<R: BufRead, W: Write>(
    config_path: &Path,
    force: bool,
    input: &mut R,
    output: &mut W,
) -> Result<Config, Error> {
    if config_path.exists() && !force {
        return Err(Error::ConfigExists(config_path.to_path_buf()));
    }
    writeln!(output, "Enter Wallet Address: (0x000000000000000000000000000)")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let wallet_address = line.trim();
    if wallet_address.is_empty() || wallet_address.contains(char::is_whitespace) {
        return Err(Error::InvalidAddress(wallet_address.to_string()));
    }
    let config = Config::new(wallet_address);
    save_config(&config, config_path)?;
    writeln!(output, "config written to {}", config_path.display())?;
    writeln!(output, "add users and their worker names to start attributing shares")?;
    Ok(config)
}

use std::path::PathBuf;

use minetally_api::prelude::*;

use crate::error::Error;

pub struct Operator {
    // The wallet address every worker mines for.
    pub address: String,

    // Who owns which workers.
    pub registry: WorkerRegistry,

    // Pool http client.
    pub client: NanopoolClient,

    // Where the share data is persisted.
    pub data_path: PathBuf,
}

impl Operator {
    /// Loads the config file. A missing config is fatal for the server;
    /// the interactive setup lives in the admin tool.
    pub fn new(
        config_path: Option<PathBuf>,
        data_path: Option<PathBuf>,
        api_url: &str,
    ) -> Result<Operator, Error> {
        let config_path = match config_path {
            Some(path) => path,
            None => default_config_path()?,
        };
        let data_path = match data_path {
            Some(path) => path,
            None => default_data_path()?,
        };
        let config = load_config(&config_path).inspect_err(|err| {
            if let ApiError::ConfigMissing(_) = err {
                log::error!(
                    "no config at {}, run `minetally-admin init` to create one",
                    config_path.display()
                );
            }
        })?;
        let client = NanopoolClient::new(api_url)?;
        Ok(Operator {
            address: config.wallet_address,
            registry: WorkerRegistry::new(config.users),
            client,
            data_path,
        })
    }

    pub async fn get_balance(&self) -> Result<Amount, Error> {
        let balance = self.client.fetch_balance(&self.address).await?;
        Ok(balance)
    }
}

use std::path::PathBuf;

use minetally_api::error::ApiError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("std io")]
    StdIo(#[from] std::io::Error),
    #[error("config already exists at {0}, pass --force to overwrite")]
    ConfigExists(PathBuf),
    #[error("invalid wallet address: {0:?}")]
    InvalidAddress(String),
}

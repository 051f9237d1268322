use minetally_api::error::ApiError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Api(#[from] ApiError),
}

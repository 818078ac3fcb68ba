use std::result;

use metadata::error::MetadataError;
use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;

pub type Result<T> = result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("BadRequest: {0}")]
    BadRequest(String),
    #[error("InvalidConfig: {0}")]
    InvalidConfig(String),
    #[error("Config: {0:?}")]
    Config(#[from] config::ConfigError),
    #[error("Metadata: {0:?}")]
    Metadata(#[from] MetadataError),
    #[error("Metrics: {0:?}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
    #[error("SetGlobalDefaultError: {0:?}")]
    SetGlobalDefaultError(SetGlobalDefaultError),
    #[error("StdIO: {0:?}")]
    StdIO(#[from] std::io::Error),
}

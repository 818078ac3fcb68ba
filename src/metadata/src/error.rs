use std::result;

use thiserror::Error;

pub type Result<T> = result::Result<T, MetadataError>;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
}

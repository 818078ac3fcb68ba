use std::collections::BTreeMap;
use std::result;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use common::http::ApiError;
use metadata::error::MetadataError;
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = result::Result<T, PlatformError>;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Maximum nodes 5 level")]
    DepthExceeded,
    #[error("re-parenting is not supported")]
    ReparentingNotSupported,
}

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("invalid fields")]
    InvalidFields(BTreeMap<String, String>),
    #[error("tree: {0}")]
    Tree(#[from] TreeError),
    #[error("metadata: {0}")]
    Metadata(#[from] MetadataError),
}

impl PlatformError {
    pub fn into_api_error(self) -> ApiError {
        match self {
            PlatformError::InvalidFields(fields) => ApiError::new(StatusCode::BAD_REQUEST)
                .with_message("invalid fields".to_string())
                .with_fields(fields),
            PlatformError::Tree(err) => match err {
                TreeError::DepthExceeded => ApiError::bad_request(err),
                TreeError::ReparentingNotSupported => ApiError::bad_request(err),
            },
            PlatformError::Metadata(err) => match err {
                MetadataError::NotFound(_) => ApiError::not_found(err),
                MetadataError::Sqlx(_) => ApiError::internal(err),
            },
        }
    }
}

impl From<ValidationErrors> for PlatformError {
    fn from(errs: ValidationErrors) -> Self {
        let fields = errs
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reason = errs
                    .first()
                    .and_then(|err| err.message.as_ref())
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| "invalid field value".to_string());
                (field.to_string(), reason)
            })
            .collect();

        PlatformError::InvalidFields(fields)
    }
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        self.into_api_error().into_response()
    }
}

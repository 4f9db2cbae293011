//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] gobarber_storage::StorageError),

    #[error("API error: {0}")]
    Api(#[from] gobarber_api::ApiError),

    #[error("Session error: {0}")]
    Session(#[from] gobarber_session::SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),
}

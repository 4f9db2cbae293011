//! Session error types

use gobarber_api::ApiError;
use gobarber_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(#[source] ApiError),

    #[error("Persisted session is malformed: {0}")]
    MalformedPersistedState(#[source] serde_json::Error),

    #[error("Failed to read persisted session: {0}")]
    PersistenceReadFailure(#[source] StorageError),

    #[error("Failed to persist session: {0}")]
    PersistenceWriteFailure(#[source] StorageError),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Another session operation is in progress")]
    OperationInProgress,

    #[error("Session changed while the request was in flight")]
    Superseded,

    #[error("Request failed: {0}")]
    Request(#[from] ApiError),

    #[error("JSON serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
}

use thiserror::Error;
use vouch_types::VouchError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}

/// Persistence failures surface to callers as internal errors; the caller
/// must treat the operation as not having happened.
impl From<StoreError> for VouchError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => VouchError::NotFound(what),
            other => VouchError::Internal(other.to_string()),
        }
    }
}

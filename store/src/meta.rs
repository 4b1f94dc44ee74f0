//! Metadata storage trait.

use crate::StoreError;

/// Key-value bookkeeping that belongs to no domain table (schema version).
pub trait MetaStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Returns [`StoreError::NotFound`] when the key has never been written.
    fn get_meta(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Schema version, or 0 for a fresh database.
    fn get_schema_version(&self) -> Result<u32, StoreError>;

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;
}

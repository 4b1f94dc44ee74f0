//! LMDB storage backend for the Vouch review platform.
//!
//! Implements all storage traits from `vouch-store` using the `heed` LMDB bindings.
//! Each logical table maps to one LMDB database within a single environment.
//! LMDB allows one write transaction at a time, so every trait method that
//! writes is serialized against every other writer.

pub mod counter;
pub mod environment;
pub mod error;
mod keys;
pub mod meta;
pub mod migration;
pub mod place;
pub mod review;
pub mod user;
pub mod vote;

pub use environment::LmdbStore;
pub use error::LmdbError;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};

//! Abstract storage traits for the Vouch review platform.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.
//!
//! Every method that creates or changes a row is an atomic operation in the
//! backend: an insert-or-update keyed by the row's unique key, never a
//! read-then-write pair split across transactions.

pub mod counter;
pub mod error;
pub mod meta;
pub mod place;
pub mod review;
pub mod user;
pub mod vote;

pub use counter::{CounterStore, WindowDecision};
pub use error::StoreError;
pub use meta::MetaStore;
pub use place::{PlaceRecord, PlaceStore};
pub use review::{ImportProvenance, NewReview, ReviewInsert, ReviewRecord, ReviewStore};
pub use user::{UserRecord, UserStore, UserUpsert};
pub use vote::{VoteRecord, VoteStore, VoteTally};

/// Everything the ledger and review engines need from one backend.
pub trait VouchStore: UserStore + PlaceStore + ReviewStore + VoteStore + Send + Sync {}

impl<T> VouchStore for T where T: UserStore + PlaceStore + ReviewStore + VoteStore + Send + Sync {}

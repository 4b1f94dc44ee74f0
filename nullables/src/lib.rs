//! In-memory stand-ins for every external collaborator.
//!
//! The ledger, review engines, and HTTP API only see traits (`Clock`, the
//! store traits, `ProofVerifier`, `PaymentOracle`). The types here implement
//! those traits without disk or network access, and expose knobs so a test
//! can move time, fail the store, or script upstream answers.

pub mod clock;
pub mod store;
pub mod upstream;

pub use clock::NullClock;
pub use store::NullStore;
pub use upstream::{NullPaymentOracle, NullProofVerifier};

//! External verification capabilities.
//!
//! The platform never checks a zero-knowledge proof or settles a payment
//! itself. It consumes two opaque capabilities:
//! 1. **Proof verifier**: accepts a proof-of-personhood payload and returns the
//!    stable subject id (nullifier) it proves.
//! 2. **Payment oracle**: reports the status, reference and sender of a
//!    payment transaction.
//!
//! Any conforming implementation satisfies the contract; the HTTP clients in
//! [`world`] talk to the World developer portal, and test doubles live in
//! `vouch-nullables`.

pub mod error;
pub mod method;
pub mod payment;
pub mod world;

pub use error::UpstreamError;
pub use method::{ProofPayload, ProofVerifier, VerifiedSubject};
pub use payment::{PaymentOracle, TransactionStatus, MINED};
pub use world::{WorldClientConfig, WorldIdVerifier, WorldPaymentOracle};

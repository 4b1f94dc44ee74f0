//! Identity and access ledger.
//!
//! The durable record of unique humans and paying wallets:
//! - [`IdentityLedger`]: race-safe creation and refresh of user rows.
//! - [`SessionResolver`]: turns an inbound credential into a viewer.
//! - [`trust`]: the only code path that writes a trust score.

pub mod identity;
pub mod session;
pub mod trust;

pub use identity::IdentityLedger;
pub use session::{Session, SessionResolver, SessionSigner};
pub use trust::{recalculate_author_trust, trust_score_for};

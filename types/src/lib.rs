//! Fundamental types for the Vouch review platform.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! identity keys, access tiers, entity identifiers, the fixed category/tag/trust
//! vocabularies, coordinates, timestamps, policy parameters, and the error taxonomy.

pub mod access;
pub mod coords;
pub mod error;
pub mod identity;
pub mod ids;
pub mod params;
pub mod review;
pub mod time;
pub mod trust;
pub mod vocab;

pub use access::{AccessTier, ViewerTier};
pub use coords::Coordinates;
pub use error::VouchError;
pub use identity::{IdentityKey, WalletAddress};
pub use ids::{PlaceId, ReviewId, VoteId};
pub use params::PolicyParams;
pub use review::{Rating, ReviewSource};
pub use time::{Clock, SystemClock, Timestamp};
pub use trust::{TrustScore, TrustTier};
pub use vocab::{Category, Tag, TagGroup};

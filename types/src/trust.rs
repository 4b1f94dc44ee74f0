//! Trust score and its display tiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reputation in `0..=100`, derived from helpfulness votes on a user's reviews.
///
/// Only constructible through [`TrustScore::clamped`]; the ledger's trust
/// recalculation is the only writer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustScore(u8);

impl TrustScore {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 100;
    /// Score assigned to every newly created user.
    pub const INITIAL: Self = Self(50);

    /// Clamp a raw formula result into range.
    pub fn clamped(raw: i64) -> Self {
        Self(raw.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn tier(&self) -> TrustTier {
        TrustTier::for_score(*self)
    }
}

impl Default for TrustScore {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl fmt::Display for TrustScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display band for a trust score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustTier {
    Low,
    Neutral,
    Reliable,
    Trusted,
}

impl TrustTier {
    /// (lower bound, tier), highest first.
    const TABLE: [(u8, TrustTier); 4] = [
        (80, TrustTier::Trusted),
        (60, TrustTier::Reliable),
        (40, TrustTier::Neutral),
        (0, TrustTier::Low),
    ];

    pub fn for_score(score: TrustScore) -> Self {
        Self::TABLE
            .iter()
            .find(|(min, _)| score.value() >= *min)
            .map(|(_, tier)| *tier)
            .unwrap_or(TrustTier::Low)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Neutral => "Neutral",
            Self::Reliable => "Reliable",
            Self::Trusted => "Trusted",
        }
    }
}

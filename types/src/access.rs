//! Access tiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The tier persisted on a user record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    /// Proof-of-personhood verified: read, post, and vote.
    #[default]
    Orb,
    /// Completed payment: read-only.
    Paid,
}

impl AccessTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orb => "orb",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The tier of whoever is making a request, including callers without a credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerTier {
    Anonymous,
    Paid,
    Orb,
}

impl ViewerTier {
    /// Whether full review content may be shown (anonymous viewers get a redacted list).
    pub fn can_read_full(&self) -> bool {
        matches!(self, Self::Paid | Self::Orb)
    }

    /// Whether this viewer may submit reviews.
    pub fn can_post(&self) -> bool {
        matches!(self, Self::Orb)
    }

    /// Whether this viewer may cast helpfulness votes.
    pub fn can_vote(&self) -> bool {
        matches!(self, Self::Orb)
    }
}

impl From<AccessTier> for ViewerTier {
    fn from(tier: AccessTier) -> Self {
        match tier {
            AccessTier::Orb => Self::Orb,
            AccessTier::Paid => Self::Paid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_orb_writes() {
        assert!(ViewerTier::Orb.can_post());
        assert!(ViewerTier::Orb.can_vote());
        assert!(!ViewerTier::Paid.can_post());
        assert!(!ViewerTier::Paid.can_vote());
        assert!(!ViewerTier::Anonymous.can_vote());
    }

    #[test]
    fn anonymous_reads_redacted() {
        assert!(!ViewerTier::Anonymous.can_read_full());
        assert!(ViewerTier::Paid.can_read_full());
    }

    #[test]
    fn tier_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&AccessTier::Paid).unwrap(), "\"paid\"");
        assert_eq!(
            serde_json::from_str::<AccessTier>("\"orb\"").unwrap(),
            AccessTier::Orb
        );
    }
}

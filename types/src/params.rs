//! Policy parameters for access, proximity, rate limiting, and trust scoring.
//!
//! The defaults are the platform policy. Deployments may tune the operational
//! values (radius, vote budget, cookie lifetimes) but the trust-score weights
//! must stay at their defaults for scores to remain comparable.

use serde::{Deserialize, Serialize};

/// All tunable policy values.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyParams {
    // ── Proximity ────────────────────────────────────────────────────────
    /// Maximum rounded distance (meters) between device and place for a submission.
    pub proximity_radius_m: u64,

    // ── Content ──────────────────────────────────────────────────────────
    /// Minimum review length in characters.
    pub min_content_chars: usize,
    /// Maximum review length in characters.
    pub max_content_chars: usize,

    // ── Votes ────────────────────────────────────────────────────────────
    /// Helpfulness votes a single voter may cast per window.
    pub votes_per_window: u32,
    /// Length of the vote rate-limit window in seconds.
    pub vote_window_secs: u64,

    // ── Trust score ──────────────────────────────────────────────────────
    /// Score every new user starts with.
    pub trust_base: i64,
    /// Points per helpful vote received.
    pub trust_helpful_weight: i64,
    /// Points removed per not-helpful vote received.
    pub trust_not_helpful_weight: i64,

    // ── Sessions ─────────────────────────────────────────────────────────
    /// Cookie lifetime for proof-of-personhood sessions.
    pub orb_session_secs: u64,
    /// Cookie lifetime for payment-tier sessions.
    pub paid_session_secs: u64,
}

impl Default for PolicyParams {
    fn default() -> Self {
        Self {
            proximity_radius_m: 50,
            min_content_chars: 1,
            max_content_chars: 500,
            votes_per_window: 50,
            vote_window_secs: 24 * 60 * 60,
            trust_base: 50,
            trust_helpful_weight: 2,
            trust_not_helpful_weight: 3,
            orb_session_secs: 7 * 24 * 60 * 60,
            paid_session_secs: 30 * 24 * 60 * 60,
        }
    }
}

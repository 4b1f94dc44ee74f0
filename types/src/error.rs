//! Request-level error taxonomy shared across crates.

use thiserror::Error;

/// Every way a request against the trust-and-access core can fail.
///
/// All variants are terminal for the request; nothing here is retried
/// automatically.
#[derive(Debug, Error)]
pub enum VouchError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("you cannot vote on your own review")]
    SelfVoteForbidden,

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("you must be within {radius_m}m of this location to post a review")]
    TooFar { distance_m: u64, radius_m: u64 },

    #[error("rate limit exceeded, try again later")]
    RateLimited,

    #[error("upstream verification failed: {0}")]
    UpstreamVerificationFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl VouchError {
    /// Short stable label, used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::SelfVoteForbidden => "self_vote",
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound(_) => "not_found",
            Self::TooFar { .. } => "too_far",
            Self::RateLimited => "rate_limited",
            Self::UpstreamVerificationFailed(_) => "upstream",
            Self::Internal(_) => "internal",
        }
    }
}

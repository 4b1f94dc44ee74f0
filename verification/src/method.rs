//! Pluggable proof-of-personhood verifier.
//!
//! The platform does not specify HOW uniqueness is proven, only that some
//! verifier vouches for a stable subject id.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::UpstreamError;

/// A proof as produced by the client-side identity kit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofPayload {
    pub nullifier_hash: String,
    pub merkle_root: String,
    pub proof: String,
    #[serde(default = "default_level")]
    pub verification_level: String,
    /// Optional signal hash bound into the proof.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_hash: Option<String>,
}

fn default_level() -> String {
    "orb".to_string()
}

/// What a successful verification proves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedSubject {
    /// Stable pseudonymous id: one per unique human and action.
    pub subject_id: String,
}

/// A pluggable proof verifier.
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    /// Human-readable name of this verifier.
    fn name(&self) -> &str;

    /// Verify `payload` for `action`. Callers must bound the call with a
    /// timeout; a timed-out call is a failure with no retained state.
    async fn verify_proof(
        &self,
        payload: &ProofPayload,
        action: &str,
    ) -> Result<VerifiedSubject, UpstreamError>;
}

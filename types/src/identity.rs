//! Identity keys and payment wallet addresses.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::VouchError;

/// Stable pseudonymous identifier for one user record.
///
/// For proof-of-personhood users this is the verifier's nullifier hash. For
/// payment-tier users it is synthesised as `paid_<wallet_address>`. Never
/// reused across users.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Prefix marking identities created through the payment flow.
    pub const PAID_PREFIX: &'static str = "paid_";

    /// Longest accepted key. Nullifiers are 66 chars; wallet-derived keys a little more.
    pub const MAX_LEN: usize = 128;

    /// Parse a raw key, rejecting empty, oversized, or control-character input.
    pub fn parse(raw: impl Into<String>) -> Result<Self, VouchError> {
        let s = raw.into();
        if s.is_empty() || s.len() > Self::MAX_LEN {
            return Err(VouchError::InvalidInput(
                "identity key must be between 1 and 128 bytes".into(),
            ));
        }
        if s.chars().any(|c| c.is_control() || c.is_whitespace() || c == ';' || c == '.') {
            return Err(VouchError::InvalidInput(
                "identity key contains forbidden characters".into(),
            ));
        }
        Ok(Self(s))
    }

    /// Identity for a payment-tier user.
    pub fn for_wallet(wallet: &WalletAddress) -> Self {
        Self(format!("{}{}", Self::PAID_PREFIX, wallet.as_str()))
    }

    /// Whether this identity was synthesised by the payment flow.
    pub fn is_paid(&self) -> bool {
        self.0.starts_with(Self::PAID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wallet address reported by the payment oracle for a completed transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(raw: impl Into<String>) -> Result<Self, VouchError> {
        let s = raw.into();
        let max = IdentityKey::MAX_LEN - IdentityKey::PAID_PREFIX.len();
        if s.is_empty() || s.len() > max || !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(VouchError::InvalidInput(format!(
                "malformed wallet address: {s:?}"
            )));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

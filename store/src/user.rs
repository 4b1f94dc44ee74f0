//! User storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use vouch_types::{AccessTier, IdentityKey, Timestamp, TrustScore, WalletAddress};

/// One verified or paying identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub identity_key: IdentityKey,
    /// Set only for payment-tier users.
    pub wallet_address: Option<WalletAddress>,
    pub trust_score: TrustScore,
    /// Number of reviews authored, maintained by the store on review insert.
    pub review_count: u64,
    pub access_tier: AccessTier,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The client-controllable part of a user row.
///
/// Trust score and review count are absent on purpose: an upsert can never
/// touch them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserUpsert {
    pub identity_key: IdentityKey,
    pub wallet_address: Option<WalletAddress>,
    pub access_tier: AccessTier,
}

impl UserUpsert {
    /// Build the row a fresh insert would produce.
    pub fn into_new_record(self, now: Timestamp) -> UserRecord {
        UserRecord {
            identity_key: self.identity_key,
            wallet_address: self.wallet_address,
            trust_score: TrustScore::INITIAL,
            review_count: 0,
            access_tier: self.access_tier,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply this upsert to an existing row, preserving score, count, and creation time.
    pub fn apply_to(self, existing: &mut UserRecord, now: Timestamp) {
        existing.wallet_address = self.wallet_address;
        existing.access_tier = self.access_tier;
        existing.updated_at = now;
    }
}

/// Trait for user storage operations.
pub trait UserStore {
    fn get_user(&self, key: &IdentityKey) -> Result<Option<UserRecord>, StoreError>;

    /// Insert-or-update by identity key in one atomic step.
    ///
    /// A new row starts at [`TrustScore::INITIAL`] with zero reviews; an
    /// existing row keeps its score, review count, and `created_at`.
    fn upsert_user(&self, upsert: &UserUpsert, now: Timestamp) -> Result<UserRecord, StoreError>;

    /// Persist a recalculated trust score. Only the ledger's trust
    /// recalculation may call this.
    fn set_trust_score(
        &self,
        key: &IdentityKey,
        score: TrustScore,
        now: Timestamp,
    ) -> Result<(), StoreError>;

    fn user_count(&self) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upsert(tier: AccessTier) -> UserUpsert {
        UserUpsert {
            identity_key: IdentityKey::parse("0xabc").unwrap(),
            wallet_address: None,
            access_tier: tier,
        }
    }

    #[test]
    fn new_record_defaults() {
        let rec = upsert(AccessTier::Orb).into_new_record(Timestamp::new(10));
        assert_eq!(rec.trust_score, TrustScore::INITIAL);
        assert_eq!(rec.review_count, 0);
        assert_eq!(rec.created_at, rec.updated_at);
    }

    #[test]
    fn apply_preserves_score_and_count() {
        let mut rec = upsert(AccessTier::Orb).into_new_record(Timestamp::new(10));
        rec.trust_score = TrustScore::clamped(77);
        rec.review_count = 4;
        upsert(AccessTier::Orb).apply_to(&mut rec, Timestamp::new(99));
        assert_eq!(rec.trust_score.value(), 77);
        assert_eq!(rec.review_count, 4);
        assert_eq!(rec.created_at, Timestamp::new(10));
        assert_eq!(rec.updated_at, Timestamp::new(99));
    }
}

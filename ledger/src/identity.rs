//! User creation and lookup.

use std::sync::Arc;

use tracing::info;
use vouch_store::{UserRecord, UserStore, UserUpsert};
use vouch_types::{AccessTier, Clock, IdentityKey, VouchError, WalletAddress};

pub struct IdentityLedger<S, C> {
    store: Arc<S>,
    clock: C,
}

impl<S: UserStore, C: Clock> IdentityLedger<S, C> {
    pub fn new(store: Arc<S>, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn get_user(&self, key: &IdentityKey) -> Result<Option<UserRecord>, VouchError> {
        Ok(self.store.get_user(key)?)
    }

    /// Record a successful proof-of-personhood verification.
    ///
    /// Re-verifying the same subject refreshes the existing row; it never
    /// creates a second one.
    pub fn upsert_verified(&self, subject_id: &str) -> Result<UserRecord, VouchError> {
        let key = IdentityKey::parse(subject_id).map_err(|_| {
            VouchError::UpstreamVerificationFailed("verifier returned an unusable subject".into())
        })?;
        // The paid namespace is reserved for wallet-derived keys.
        if key.is_paid() {
            return Err(VouchError::UpstreamVerificationFailed(
                "verifier returned a reserved subject".into(),
            ));
        }
        let user = self.store.upsert_user(
            &UserUpsert {
                identity_key: key,
                wallet_address: None,
                access_tier: AccessTier::Orb,
            },
            self.clock.now(),
        )?;
        info!(identity = %user.identity_key, "verified user upserted");
        Ok(user)
    }

    /// Record a completed payment from `wallet`. The identity is
    /// `paid_<wallet>` and the tier is always `paid`.
    pub fn upsert_paid(&self, wallet: WalletAddress) -> Result<UserRecord, VouchError> {
        let user = self.store.upsert_user(
            &UserUpsert {
                identity_key: IdentityKey::for_wallet(&wallet),
                wallet_address: Some(wallet),
                access_tier: AccessTier::Paid,
            },
            self.clock.now(),
        )?;
        info!(identity = %user.identity_key, "paid user upserted");
        Ok(user)
    }
}

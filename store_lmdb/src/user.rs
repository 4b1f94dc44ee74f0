//! LMDB implementation of UserStore.
//!
//! Key format: the identity key's UTF-8 bytes.

use vouch_store::{StoreError, UserRecord, UserStore, UserUpsert};
use vouch_types::{IdentityKey, Timestamp, TrustScore};

use crate::keys::{decode, encode};
use crate::{LmdbError, LmdbStore};

impl UserStore for LmdbStore {
    fn get_user(&self, key: &IdentityKey) -> Result<Option<UserRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let user = self
            .dbs
            .users
            .get(&rtxn, key.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .map(decode::<UserRecord>)
            .transpose()?;
        Ok(user)
    }

    fn upsert_user(&self, upsert: &UserUpsert, now: Timestamp) -> Result<UserRecord, StoreError> {
        let db_key = upsert.identity_key.as_str().as_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existing = self
            .dbs
            .users
            .get(&wtxn, db_key)
            .map_err(LmdbError::from)?
            .map(decode::<UserRecord>)
            .transpose()?;

        let record = match existing {
            Some(mut rec) => {
                upsert.clone().apply_to(&mut rec, now);
                rec
            }
            None => upsert.clone().into_new_record(now),
        };

        let bytes = encode(&record)?;
        self.dbs
            .users
            .put(&mut wtxn, db_key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(record)
    }

    fn set_trust_score(
        &self,
        key: &IdentityKey,
        score: TrustScore,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let db_key = key.as_str().as_bytes();
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut record: UserRecord = self
            .dbs
            .users
            .get(&wtxn, db_key)
            .map_err(LmdbError::from)?
            .map(decode)
            .transpose()?
            .ok_or_else(|| LmdbError::NotFound(format!("user {}", key)))?;
        record.trust_score = score;
        record.updated_at = now;
        let bytes = encode(&record)?;
        self.dbs
            .users
            .put(&mut wtxn, db_key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.dbs.users.len(&rtxn).map_err(LmdbError::from)?)
    }
}

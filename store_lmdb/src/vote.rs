//! LMDB implementation of VoteStore.
//!
//! Key format: `review_id ++ voter` (binary composite key). Review ids are a
//! fixed 16 bytes, so a prefix scan on the id yields exactly that review's votes.

use vouch_store::{StoreError, VoteRecord, VoteStore, VoteTally};
use vouch_types::{IdentityKey, ReviewId, Timestamp, VoteId};

use crate::keys::{decode, encode, scan_prefix, vote_key};
use crate::{LmdbError, LmdbStore};

impl VoteStore for LmdbStore {
    fn upsert_vote(
        &self,
        review_id: &ReviewId,
        voter: &IdentityKey,
        is_helpful: bool,
        now: Timestamp,
    ) -> Result<VoteRecord, StoreError> {
        let key = vote_key(review_id, voter);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let existing = self
            .dbs
            .votes
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .map(decode::<VoteRecord>)
            .transpose()?;

        let record = match existing {
            Some(mut vote) => {
                vote.is_helpful = is_helpful;
                vote
            }
            None => VoteRecord {
                id: VoteId::generate().map_err(|e| StoreError::Backend(e.to_string()))?,
                review_id: *review_id,
                voter: voter.clone(),
                is_helpful,
                created_at: now,
            },
        };

        let bytes = encode(&record)?;
        self.dbs
            .votes
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(record)
    }

    fn tally_votes(&self, review_id: &ReviewId) -> Result<VoteTally, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut tally = VoteTally::default();
        for (_key, val) in scan_prefix(&self.dbs.votes, &rtxn, review_id.as_bytes())? {
            let vote: VoteRecord = decode(&val)?;
            tally.record(vote.is_helpful);
        }
        Ok(tally)
    }

    fn votes_by_voter(
        &self,
        voter: &IdentityKey,
        reviews: &[ReviewId],
    ) -> Result<Vec<VoteRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut out = Vec::new();
        for review_id in reviews {
            let vote = self
                .dbs
                .votes
                .get(&rtxn, &vote_key(review_id, voter))
                .map_err(LmdbError::from)?
                .map(decode::<VoteRecord>)
                .transpose()?;
            out.extend(vote);
        }
        Ok(out)
    }
}

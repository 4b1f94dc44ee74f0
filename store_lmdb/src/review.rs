//! LMDB implementation of ReviewStore.
//!
//! The `reviews` table is keyed by review id. Two index tables give ordered
//! listings: `place_reviews` and `author_reviews`, both with a big-endian
//! `created_at` and insertion sequence ahead of the id so that a prefix scan
//! yields oldest first, ties in write order.

use heed::types::Bytes;
use heed::{Database, RoTxn, RwTxn};
use vouch_store::{
    NewReview, ReviewInsert, ReviewRecord, ReviewStore, StoreError, UserRecord, VoteTally,
};
use vouch_types::{IdentityKey, PlaceId, ReviewId};

use crate::keys::{
    author_review_key, decode, encode, identity_prefix, place_review_key, review_id_from,
    scan_prefix, submission_key, trailing_review_id, ReviewOrder,
};

/// Meta key holding the next review insertion sequence (big-endian u64).
const REVIEW_SEQ_KEY: &[u8] = b"review_seq";
use crate::{LmdbError, LmdbStore};

impl LmdbStore {
    fn review_in(
        &self,
        txn: &RoTxn,
        id: &ReviewId,
    ) -> Result<Option<ReviewRecord>, LmdbError> {
        self.dbs
            .reviews
            .get(txn, id.as_bytes())?
            .map(decode::<ReviewRecord>)
            .transpose()
    }

    /// Resolve the index entries under `prefix` to reviews, newest first.
    fn reviews_by_index(
        &self,
        index: Database<Bytes, Bytes>,
        prefix: &[u8],
    ) -> Result<Vec<ReviewRecord>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let mut out = Vec::new();
        for (key, _) in scan_prefix(&index, &rtxn, prefix)?.into_iter().rev() {
            let id = trailing_review_id(&key)?;
            let review = self.review_in(&rtxn, &id)?.ok_or_else(|| {
                LmdbError::Corruption(format!("index points at missing review {id}"))
            })?;
            out.push(review);
        }
        Ok(out)
    }

    /// Take the next insertion sequence inside `wtxn`.
    fn next_review_seq(&self, wtxn: &mut RwTxn) -> Result<u64, LmdbError> {
        let seq = match self.dbs.meta.get(wtxn, REVIEW_SEQ_KEY)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                    LmdbError::Corruption("review_seq has unexpected byte length".into())
                })?;
                u64::from_be_bytes(arr)
            }
            None => 0,
        };
        self.dbs
            .meta
            .put(wtxn, REVIEW_SEQ_KEY, &(seq + 1).to_be_bytes())?;
        Ok(seq)
    }

    fn write_review_rows(
        &self,
        wtxn: &mut RwTxn,
        record: &ReviewRecord,
    ) -> Result<(), LmdbError> {
        let order = ReviewOrder {
            created_at: record.created_at,
            seq: self.next_review_seq(wtxn)?,
        };
        let bytes = encode(record)?;
        self.dbs.reviews.put(wtxn, record.id.as_bytes(), &bytes)?;
        self.dbs.place_reviews.put(
            wtxn,
            &place_review_key(&record.place_id, order, &record.id),
            &[],
        )?;
        if let Some(author) = &record.author {
            self.dbs.author_reviews.put(
                wtxn,
                &author_review_key(author, order, &record.id),
                &[],
            )?;
        }
        Ok(())
    }
}

impl ReviewStore for LmdbStore {
    fn insert_review(&self, review: &NewReview) -> Result<ReviewInsert, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let sub_key = review
            .submission_key
            .as_deref()
            .map(|k| submission_key(&review.author, k));
        if let Some(sub_key) = &sub_key {
            let earlier = self
                .dbs
                .submissions
                .get(&wtxn, sub_key)
                .map_err(LmdbError::from)?
                .map(review_id_from)
                .transpose()?;
            if let Some(earlier) = earlier {
                let record = self.review_in(&wtxn, &earlier)?.ok_or_else(|| {
                    LmdbError::Corruption(format!("submission for missing review {earlier}"))
                })?;
                // Dropping the write txn aborts it; nothing was written.
                return Ok(ReviewInsert::Duplicate(record));
            }
        }

        let author_key = review.author.as_str().as_bytes();
        let mut author: UserRecord = self
            .dbs
            .users
            .get(&wtxn, author_key)
            .map_err(LmdbError::from)?
            .map(decode)
            .transpose()?
            .ok_or_else(|| LmdbError::NotFound(format!("user {}", review.author)))?;

        let record = review.clone().into_record();
        self.write_review_rows(&mut wtxn, &record)?;
        if let Some(sub_key) = &sub_key {
            self.dbs
                .submissions
                .put(&mut wtxn, sub_key, record.id.as_bytes())
                .map_err(LmdbError::from)?;
        }

        author.review_count += 1;
        author.updated_at = record.created_at;
        let author_bytes = encode(&author)?;
        self.dbs
            .users
            .put(&mut wtxn, author_key, &author_bytes)
            .map_err(LmdbError::from)?;

        wtxn.commit().map_err(LmdbError::from)?;
        Ok(ReviewInsert::Created(record))
    }

    fn insert_imported_review(&self, review: &ReviewRecord) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.write_review_rows(&mut wtxn, review)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_review(&self, id: &ReviewId) -> Result<Option<ReviewRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.review_in(&rtxn, id)?)
    }

    fn reviews_for_place(&self, place: &PlaceId) -> Result<Vec<ReviewRecord>, StoreError> {
        Ok(self.reviews_by_index(self.dbs.place_reviews, place.as_bytes())?)
    }

    fn reviews_by_author(&self, author: &IdentityKey) -> Result<Vec<ReviewRecord>, StoreError> {
        let prefix = identity_prefix(author);
        Ok(self.reviews_by_index(self.dbs.author_reviews, &prefix)?)
    }

    fn set_vote_counts(
        &self,
        id: &ReviewId,
        tally: VoteTally,
    ) -> Result<ReviewRecord, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut record = self
            .review_in(&wtxn, id)?
            .ok_or_else(|| LmdbError::NotFound(format!("review {id}")))?;
        record.helpful_count = tally.helpful;
        record.not_helpful_count = tally.not_helpful;
        let bytes = encode(&record)?;
        self.dbs
            .reviews
            .put(&mut wtxn, id.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(record)
    }
}

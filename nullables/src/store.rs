//! Nullable store: thread-safe in-memory storage for testing.
//!
//! One mutex guards every table, and each trait method holds it for its whole
//! body, so every operation is atomic just like an LMDB write transaction.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use vouch_store::{
    CounterStore, NewReview, PlaceRecord, PlaceStore, ReviewInsert, ReviewRecord, ReviewStore,
    StoreError, UserRecord, UserStore, UserUpsert, VoteRecord, VoteStore, VoteTally,
    WindowDecision,
};
use vouch_types::{IdentityKey, PlaceId, ReviewId, Timestamp, TrustScore, VoteId};

#[derive(Default)]
struct Tables {
    users: HashMap<IdentityKey, UserRecord>,
    places: BTreeMap<PlaceId, PlaceRecord>,
    /// Insertion sequence alongside each review, to break `created_at` ties.
    reviews: HashMap<ReviewId, (u64, ReviewRecord)>,
    next_seq: u64,
    submissions: HashMap<(IdentityKey, String), ReviewId>,
    votes: HashMap<(ReviewId, IdentityKey), VoteRecord>,
    windows: HashMap<String, (u32, Timestamp)>,
}

impl Tables {
    fn push_review(&mut self, record: ReviewRecord) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.reviews.insert(record.id, (seq, record));
    }

    fn newest_first<'a>(&'a self, filter: impl Fn(&ReviewRecord) -> bool) -> Vec<ReviewRecord> {
        let mut matching: Vec<&'a (u64, ReviewRecord)> =
            self.reviews.values().filter(|(_, r)| filter(r)).collect();
        matching.sort_by(|(sa, a), (sb, b)| (b.created_at, sb).cmp(&(a.created_at, sa)));
        matching.into_iter().map(|(_, r)| r.clone()).collect()
    }
}

/// An in-memory implementation of every store trait.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Default)]
pub struct NullStore {
    tables: Mutex<Tables>,
    failing: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with a backend error (or stop doing so).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of vote rows, across all reviews.
    pub fn vote_count(&self) -> usize {
        self.tables.lock().unwrap().votes.len()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("null store set to fail".into()));
        }
        Ok(self.tables.lock().unwrap())
    }
}

impl UserStore for NullStore {
    fn get_user(&self, key: &IdentityKey) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.tables()?.users.get(key).cloned())
    }

    fn upsert_user(&self, upsert: &UserUpsert, now: Timestamp) -> Result<UserRecord, StoreError> {
        let mut t = self.tables()?;
        let record = match t.users.get_mut(&upsert.identity_key) {
            Some(existing) => {
                upsert.clone().apply_to(existing, now);
                existing.clone()
            }
            None => {
                let record = upsert.clone().into_new_record(now);
                t.users.insert(record.identity_key.clone(), record.clone());
                record
            }
        };
        Ok(record)
    }

    fn set_trust_score(
        &self,
        key: &IdentityKey,
        score: TrustScore,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let mut t = self.tables()?;
        let user = t
            .users
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(format!("user {key}")))?;
        user.trust_score = score;
        user.updated_at = now;
        Ok(())
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        Ok(self.tables()?.users.len() as u64)
    }
}

impl PlaceStore for NullStore {
    fn put_place(&self, place: &PlaceRecord) -> Result<(), StoreError> {
        self.tables()?.places.insert(place.id, place.clone());
        Ok(())
    }

    fn get_place(&self, id: &PlaceId) -> Result<Option<PlaceRecord>, StoreError> {
        Ok(self.tables()?.places.get(id).cloned())
    }

    fn list_places(&self) -> Result<Vec<PlaceRecord>, StoreError> {
        Ok(self.tables()?.places.values().cloned().collect())
    }
}

impl ReviewStore for NullStore {
    fn insert_review(&self, review: &NewReview) -> Result<ReviewInsert, StoreError> {
        let mut t = self.tables()?;
        let sub_key = review
            .submission_key
            .as_ref()
            .map(|k| (review.author.clone(), k.clone()));

        if let Some(sub_key) = &sub_key {
            if let Some(earlier) = t.submissions.get(sub_key) {
                let (_, record) = t
                    .reviews
                    .get(earlier)
                    .ok_or_else(|| StoreError::Corruption("dangling submission key".into()))?;
                return Ok(ReviewInsert::Duplicate(record.clone()));
            }
        }

        let author = t
            .users
            .get_mut(&review.author)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", review.author)))?;
        author.review_count += 1;
        author.updated_at = review.created_at;

        let record = review.clone().into_record();
        if let Some(sub_key) = sub_key {
            t.submissions.insert(sub_key, record.id);
        }
        t.push_review(record.clone());
        Ok(ReviewInsert::Created(record))
    }

    fn insert_imported_review(&self, review: &ReviewRecord) -> Result<(), StoreError> {
        self.tables()?.push_review(review.clone());
        Ok(())
    }

    fn get_review(&self, id: &ReviewId) -> Result<Option<ReviewRecord>, StoreError> {
        Ok(self.tables()?.reviews.get(id).map(|(_, r)| r.clone()))
    }

    fn reviews_for_place(&self, place: &PlaceId) -> Result<Vec<ReviewRecord>, StoreError> {
        Ok(self.tables()?.newest_first(|r| r.place_id == *place))
    }

    fn reviews_by_author(&self, author: &IdentityKey) -> Result<Vec<ReviewRecord>, StoreError> {
        Ok(self.tables()?.newest_first(|r| r.is_authored_by(author)))
    }

    fn set_vote_counts(
        &self,
        id: &ReviewId,
        tally: VoteTally,
    ) -> Result<ReviewRecord, StoreError> {
        let mut t = self.tables()?;
        let (_, record) = t
            .reviews
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("review {id}")))?;
        record.helpful_count = tally.helpful;
        record.not_helpful_count = tally.not_helpful;
        Ok(record.clone())
    }
}

impl VoteStore for NullStore {
    fn upsert_vote(
        &self,
        review_id: &ReviewId,
        voter: &IdentityKey,
        is_helpful: bool,
        now: Timestamp,
    ) -> Result<VoteRecord, StoreError> {
        let mut t = self.tables()?;
        let key = (*review_id, voter.clone());
        if let Some(existing) = t.votes.get_mut(&key) {
            existing.is_helpful = is_helpful;
            return Ok(existing.clone());
        }
        let record = VoteRecord {
            id: VoteId::generate().map_err(|e| StoreError::Backend(e.to_string()))?,
            review_id: *review_id,
            voter: voter.clone(),
            is_helpful,
            created_at: now,
        };
        t.votes.insert(key, record.clone());
        Ok(record)
    }

    fn tally_votes(&self, review_id: &ReviewId) -> Result<VoteTally, StoreError> {
        let t = self.tables()?;
        let mut tally = VoteTally::default();
        t.votes
            .values()
            .filter(|v| v.review_id == *review_id)
            .for_each(|v| tally.record(v.is_helpful));
        Ok(tally)
    }

    fn votes_by_voter(
        &self,
        voter: &IdentityKey,
        reviews: &[ReviewId],
    ) -> Result<Vec<VoteRecord>, StoreError> {
        let t = self.tables()?;
        Ok(reviews
            .iter()
            .filter_map(|id| t.votes.get(&(*id, voter.clone())).cloned())
            .collect())
    }
}

impl CounterStore for NullStore {
    fn consume_window(
        &self,
        key: &str,
        max: u32,
        window_secs: u64,
        now: Timestamp,
    ) -> Result<WindowDecision, StoreError> {
        let mut t = self.tables()?;
        let window = t
            .windows
            .entry(key.to_string())
            .or_insert((0, now.plus(window_secs)));
        if window.1 <= now {
            *window = (0, now.plus(window_secs));
        }
        if window.0 >= max {
            return Ok(WindowDecision {
                allowed: false,
                remaining: 0,
            });
        }
        window.0 += 1;
        Ok(WindowDecision {
            allowed: true,
            remaining: max - window.0,
        })
    }

    fn purge_expired_windows(&self, now: Timestamp) -> Result<usize, StoreError> {
        let mut t = self.tables()?;
        let before = t.windows.len();
        t.windows.retain(|_, (_, reset_at)| *reset_at > now);
        Ok(before - t.windows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_types::AccessTier;

    fn user(store: &NullStore, k: &str) -> IdentityKey {
        let key = IdentityKey::parse(k).unwrap();
        store
            .upsert_user(
                &UserUpsert {
                    identity_key: key.clone(),
                    wallet_address: None,
                    access_tier: AccessTier::Orb,
                },
                Timestamp::new(1),
            )
            .unwrap();
        key
    }

    fn review(author: &IdentityKey, at: u64) -> NewReview {
        NewReview {
            id: ReviewId::generate().unwrap(),
            place_id: PlaceId::new([1; 16]),
            author: author.clone(),
            content: "ok".into(),
            rating: None,
            tags: vec![],
            created_at: Timestamp::new(at),
            submission_key: None,
        }
    }

    #[test]
    fn ties_on_created_at_list_latest_insert_first() {
        let store = NullStore::new();
        let u = user(&store, "0xaaa");
        let first = store.insert_review(&review(&u, 5)).unwrap();
        let second = store.insert_review(&review(&u, 5)).unwrap();
        let listed = store.reviews_by_author(&u).unwrap();
        assert_eq!(listed[0].id, second.record().id);
        assert_eq!(listed[1].id, first.record().id);
    }

    #[test]
    fn failing_store_rejects_everything() {
        let store = NullStore::new();
        let u = user(&store, "0xaaa");
        store.set_failing(true);
        assert!(store.get_user(&u).is_err());
        store.set_failing(false);
        assert!(store.get_user(&u).unwrap().is_some());
    }

    #[test]
    fn vote_upsert_keeps_one_row_per_voter() {
        let store = NullStore::new();
        let voter = user(&store, "0xbbb");
        let rid = ReviewId::new([9; 16]);
        store.upsert_vote(&rid, &voter, true, Timestamp::new(1)).unwrap();
        store.upsert_vote(&rid, &voter, false, Timestamp::new(2)).unwrap();
        assert_eq!(store.vote_count(), 1);
        assert_eq!(
            store.tally_votes(&rid).unwrap(),
            VoteTally {
                helpful: 0,
                not_helpful: 1
            }
        );
    }
}

//! Vote storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use vouch_types::{IdentityKey, ReviewId, Timestamp, VoteId};

/// One voter's current judgement on one review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: VoteId,
    pub review_id: ReviewId,
    pub voter: IdentityKey,
    pub is_helpful: bool,
    pub created_at: Timestamp,
}

/// Helpful and not-helpful counts over some set of votes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub helpful: u64,
    pub not_helpful: u64,
}

impl VoteTally {
    pub fn record(&mut self, is_helpful: bool) {
        if is_helpful {
            self.helpful += 1;
        } else {
            self.not_helpful += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.helpful + self.not_helpful
    }
}

impl std::ops::Add for VoteTally {
    type Output = VoteTally;

    fn add(self, rhs: VoteTally) -> VoteTally {
        VoteTally {
            helpful: self.helpful + rhs.helpful,
            not_helpful: self.not_helpful + rhs.not_helpful,
        }
    }
}

impl std::iter::Sum for VoteTally {
    fn sum<I: Iterator<Item = VoteTally>>(iter: I) -> VoteTally {
        iter.fold(VoteTally::default(), |acc, t| acc + t)
    }
}

/// Trait for vote storage operations.
///
/// Keys are `(review_id, voter)` pairs; there is at most one vote per pair.
pub trait VoteStore {
    /// Insert a vote, or overwrite the polarity of the existing one.
    ///
    /// An overwrite keeps the original id and `created_at`.
    fn upsert_vote(
        &self,
        review_id: &ReviewId,
        voter: &IdentityKey,
        is_helpful: bool,
        now: Timestamp,
    ) -> Result<VoteRecord, StoreError>;

    /// Count the vote rows for a review.
    fn tally_votes(&self, review_id: &ReviewId) -> Result<VoteTally, StoreError>;

    /// The voter's votes restricted to the given reviews.
    fn votes_by_voter(
        &self,
        voter: &IdentityKey,
        reviews: &[ReviewId],
    ) -> Result<Vec<VoteRecord>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_sums() {
        let mut a = VoteTally::default();
        a.record(true);
        a.record(false);
        a.record(true);
        let b = VoteTally {
            helpful: 1,
            not_helpful: 4,
        };
        let total: VoteTally = [a, b].into_iter().sum();
        assert_eq!(total, VoteTally { helpful: 3, not_helpful: 5 });
        assert_eq!(total.total(), 8);
    }
}

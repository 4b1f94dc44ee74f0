//! Review storage trait.

use crate::{StoreError, VoteTally};
use serde::{Deserialize, Serialize};
use vouch_types::{IdentityKey, PlaceId, Rating, ReviewId, ReviewSource, Tag, Timestamp};

/// Where an imported review came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportProvenance {
    pub original_platform: String,
    pub original_author: Option<String>,
    pub imported_at: Timestamp,
}

/// A stored review.
///
/// Content is immutable after creation; only the two vote counters change,
/// and only through [`ReviewStore::set_vote_counts`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub id: ReviewId,
    pub place_id: PlaceId,
    /// Absent for imported reviews.
    pub author: Option<IdentityKey>,
    pub content: String,
    pub rating: Option<Rating>,
    pub tags: Vec<Tag>,
    pub helpful_count: u64,
    pub not_helpful_count: u64,
    pub source: ReviewSource,
    pub provenance: Option<ImportProvenance>,
    pub created_at: Timestamp,
}

impl ReviewRecord {
    pub fn is_authored_by(&self, key: &IdentityKey) -> bool {
        self.author.as_ref() == Some(key)
    }

    pub fn tally(&self) -> VoteTally {
        VoteTally {
            helpful: self.helpful_count,
            not_helpful: self.not_helpful_count,
        }
    }
}

/// A user-authored review about to be persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct NewReview {
    pub id: ReviewId,
    pub place_id: PlaceId,
    pub author: IdentityKey,
    pub content: String,
    pub rating: Option<Rating>,
    pub tags: Vec<Tag>,
    pub created_at: Timestamp,
    /// Client-supplied key deduplicating retried submissions per author.
    pub submission_key: Option<String>,
}

impl NewReview {
    pub fn into_record(self) -> ReviewRecord {
        ReviewRecord {
            id: self.id,
            place_id: self.place_id,
            author: Some(self.author),
            content: self.content,
            rating: self.rating,
            tags: self.tags,
            helpful_count: 0,
            not_helpful_count: 0,
            source: ReviewSource::User,
            provenance: None,
            created_at: self.created_at,
        }
    }
}

/// Result of inserting a user review.
#[derive(Clone, Debug, PartialEq)]
pub enum ReviewInsert {
    Created(ReviewRecord),
    /// The author already submitted with the same submission key; nothing
    /// was written and the earlier review is returned.
    Duplicate(ReviewRecord),
}

impl ReviewInsert {
    pub fn record(&self) -> &ReviewRecord {
        match self {
            ReviewInsert::Created(r) | ReviewInsert::Duplicate(r) => r,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, ReviewInsert::Duplicate(_))
    }
}

/// Trait for review storage operations.
pub trait ReviewStore {
    /// Persist a user review.
    ///
    /// In one transaction: checks the `(author, submission_key)` mapping,
    /// writes the review, records the mapping, and increments the author's
    /// `review_count`. Fails with [`StoreError::NotFound`] if the author has
    /// no user row.
    fn insert_review(&self, review: &NewReview) -> Result<ReviewInsert, StoreError>;

    /// Persist an imported review. Touches no user row.
    fn insert_imported_review(&self, review: &ReviewRecord) -> Result<(), StoreError>;

    fn get_review(&self, id: &ReviewId) -> Result<Option<ReviewRecord>, StoreError>;

    /// All reviews for a place, newest first.
    fn reviews_for_place(&self, place: &PlaceId) -> Result<Vec<ReviewRecord>, StoreError>;

    /// All reviews written by an author, newest first.
    fn reviews_by_author(&self, author: &IdentityKey) -> Result<Vec<ReviewRecord>, StoreError>;

    /// Overwrite the vote counters with a freshly computed tally.
    fn set_vote_counts(&self, id: &ReviewId, tally: VoteTally)
        -> Result<ReviewRecord, StoreError>;
}

//! Composite key builders and value codecs shared by the table impls.
//!
//! Identity keys are variable length, so every key that starts with one is
//! terminated by a `0x00` byte. Identity keys never contain control
//! characters, which keeps prefix scans unambiguous.

use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, RoTxn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use vouch_types::{IdentityKey, PlaceId, ReviewId, Timestamp};

use crate::LmdbError;

const SEP: u8 = 0x00;

/// Exclusive upper bound for a prefix scan: the prefix with its last
/// non-`0xff` byte incremented. `None` when no such bound exists.
pub(crate) fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.last_mut() {
        if *last < 0xff {
            *last += 1;
            return Some(upper);
        }
        upper.pop();
    }
    None
}

/// Owned copies of every entry whose key starts with `prefix`, in key order.
pub(crate) fn scan_prefix(
    db: &Database<Bytes, Bytes>,
    txn: &RoTxn,
    prefix: &[u8],
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, LmdbError> {
    let upper = prefix_upper_bound(prefix);
    let bounds: (Bound<&[u8]>, Bound<&[u8]>) = (
        Bound::Included(prefix),
        match &upper {
            Some(u) => Bound::Excluded(u.as_slice()),
            None => Bound::Unbounded,
        },
    );
    let mut out = Vec::new();
    for entry in db.range(txn, &bounds)? {
        let (k, v) = entry?;
        out.push((k.to_vec(), v.to_vec()));
    }
    Ok(out)
}

pub(crate) fn identity_prefix(key: &IdentityKey) -> Vec<u8> {
    let raw = key.as_str().as_bytes();
    let mut out = Vec::with_capacity(raw.len() + 1);
    out.extend_from_slice(raw);
    out.push(SEP);
    out
}

/// Where a review sorts within an index: creation second, then insertion
/// sequence so that reviews from the same second keep their write order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ReviewOrder {
    pub created_at: Timestamp,
    pub seq: u64,
}

impl ReviewOrder {
    fn append_to(self, key: &mut Vec<u8>) {
        key.extend_from_slice(&self.created_at.as_secs().to_be_bytes());
        key.extend_from_slice(&self.seq.to_be_bytes());
    }
}

/// `place_id ++ created_at_be ++ seq_be ++ review_id`
pub(crate) fn place_review_key(place: &PlaceId, order: ReviewOrder, review: &ReviewId) -> Vec<u8> {
    let mut key = Vec::with_capacity(16 + 8 + 8 + 16);
    key.extend_from_slice(place.as_bytes());
    order.append_to(&mut key);
    key.extend_from_slice(review.as_bytes());
    key
}

/// `author ++ 0x00 ++ created_at_be ++ seq_be ++ review_id`
pub(crate) fn author_review_key(
    author: &IdentityKey,
    order: ReviewOrder,
    review: &ReviewId,
) -> Vec<u8> {
    let mut key = identity_prefix(author);
    order.append_to(&mut key);
    key.extend_from_slice(review.as_bytes());
    key
}

/// `author ++ 0x00 ++ submission_key`
pub(crate) fn submission_key(author: &IdentityKey, submission: &str) -> Vec<u8> {
    let mut key = identity_prefix(author);
    key.extend_from_slice(submission.as_bytes());
    key
}

/// `review_id ++ voter`
pub(crate) fn vote_key(review: &ReviewId, voter: &IdentityKey) -> Vec<u8> {
    let voter = voter.as_str().as_bytes();
    let mut key = Vec::with_capacity(16 + voter.len());
    key.extend_from_slice(review.as_bytes());
    key.extend_from_slice(voter);
    key
}

/// The trailing 16 bytes of an index key, as a review id.
pub(crate) fn trailing_review_id(key: &[u8]) -> Result<ReviewId, LmdbError> {
    let start = key
        .len()
        .checked_sub(16)
        .ok_or_else(|| LmdbError::Corruption("index key shorter than a review id".into()))?;
    review_id_from(&key[start..])
}

pub(crate) fn review_id_from(bytes: &[u8]) -> Result<ReviewId, LmdbError> {
    let arr: [u8; 16] = bytes
        .try_into()
        .map_err(|_| LmdbError::Corruption(format!("review id of {} bytes", bytes.len())))?;
    Ok(ReviewId::new(arr))
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, LmdbError> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

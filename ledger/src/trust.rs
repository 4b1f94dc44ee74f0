//! Trust score recalculation.
//!
//! Scores are recomputed from the author's full vote totals every time; they
//! are never nudged incrementally. `recalculate_author_trust` is the only
//! caller of `UserStore::set_trust_score`.

use tracing::debug;
use vouch_store::{ReviewStore, UserStore, VoteTally};
use vouch_types::{IdentityKey, PolicyParams, Timestamp, TrustScore, VouchError};

/// `clamp(base + helpful_weight * helpful - not_helpful_weight * not_helpful, 0, 100)`.
pub fn trust_score_for(totals: VoteTally, params: &PolicyParams) -> TrustScore {
    let helpful = i64::try_from(totals.helpful).unwrap_or(i64::MAX);
    let not_helpful = i64::try_from(totals.not_helpful).unwrap_or(i64::MAX);
    let raw = params
        .trust_base
        .saturating_add(params.trust_helpful_weight.saturating_mul(helpful))
        .saturating_sub(params.trust_not_helpful_weight.saturating_mul(not_helpful));
    TrustScore::clamped(raw)
}

/// Sum the counts over every review `author` wrote and persist the resulting score.
pub fn recalculate_author_trust<S>(
    store: &S,
    author: &IdentityKey,
    params: &PolicyParams,
    now: Timestamp,
) -> Result<TrustScore, VouchError>
where
    S: ReviewStore + UserStore + ?Sized,
{
    let totals: VoteTally = store
        .reviews_by_author(author)?
        .iter()
        .map(|r| r.tally())
        .sum();
    let score = trust_score_for(totals, params);
    store.set_trust_score(author, score, now)?;
    debug!(
        identity = %author,
        helpful = totals.helpful,
        not_helpful = totals.not_helpful,
        score = score.value(),
        "trust score recalculated"
    );
    Ok(score)
}

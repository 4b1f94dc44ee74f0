//! Helpfulness votes and trust recalculation.
//!
//! Preconditions are checked in a fixed order: orb tier, rate limit, review
//! exists, not the voter's own review. On success the vote row is upserted,
//! the review's counts are recounted from the vote rows, and the author's
//! trust score is recomputed from the totals over all of their reviews.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};
use vouch_ledger::{recalculate_author_trust, Session};
use vouch_limiter::{vote_key, RateLimiter};
use vouch_store::{VoteRecord, VoteTally, VouchStore};
use vouch_types::{AccessTier, Clock, PolicyParams, ReviewId, TrustScore, VouchError};

/// A settled vote and the review's recomputed counts.
#[derive(Clone, Debug, PartialEq)]
pub struct VoteOutcome {
    pub vote: VoteRecord,
    pub counts: VoteTally,
    /// `None` for imported reviews, which have no author to score.
    pub author_trust: Option<TrustScore>,
}

pub struct VoteEngine<S, C> {
    store: Arc<S>,
    limiter: Arc<dyn RateLimiter>,
    clock: C,
    params: PolicyParams,
    /// Held from recount to trust write so a stale tally never lands after a
    /// fresher one from this process.
    settle: Mutex<()>,
}

impl<S: VouchStore, C: Clock> VoteEngine<S, C> {
    pub fn new(
        store: Arc<S>,
        limiter: Arc<dyn RateLimiter>,
        clock: C,
        params: PolicyParams,
    ) -> Self {
        Self {
            store,
            limiter,
            clock,
            params,
            settle: Mutex::new(()),
        }
    }

    pub fn submit_vote(
        &self,
        session: &Session,
        review_id: &ReviewId,
        is_helpful: bool,
    ) -> Result<VoteOutcome, VouchError> {
        let voter = session.require_user()?;
        if voter.access_tier != AccessTier::Orb {
            return Err(VouchError::Forbidden(
                "Only Orb-verified users can vote".into(),
            ));
        }

        let decision = self.limiter.try_consume(
            &vote_key(voter.identity_key.as_str()),
            self.params.votes_per_window,
            self.params.vote_window_secs,
        )?;
        if !decision.allowed {
            debug!(identity = %voter.identity_key, "vote rate limited");
            return Err(VouchError::RateLimited);
        }

        let review = self
            .store
            .get_review(review_id)?
            .ok_or_else(|| VouchError::NotFound("Review".into()))?;
        if review.is_authored_by(&voter.identity_key) {
            return Err(VouchError::SelfVoteForbidden);
        }

        let now = self.clock.now();
        let vote = self
            .store
            .upsert_vote(review_id, &voter.identity_key, is_helpful, now)?;

        let _settle = self
            .settle
            .lock()
            .map_err(|_| VouchError::Internal("vote settle lock poisoned".into()))?;
        let counts = self.store.tally_votes(review_id)?;
        self.store.set_vote_counts(review_id, counts)?;
        let author_trust = match &review.author {
            Some(author) => {
                match recalculate_author_trust(self.store.as_ref(), author, &self.params, now) {
                    Ok(score) => Some(score),
                    // The vote and counts are already committed.
                    Err(VouchError::NotFound(what)) => {
                        warn!(identity = %author, %what, "author row missing, trust not updated");
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
            None => None,
        };

        info!(
            review_id = %review_id,
            voter = %voter.identity_key,
            is_helpful,
            helpful = counts.helpful,
            not_helpful = counts.not_helpful,
            "vote settled"
        );
        Ok(VoteOutcome {
            vote,
            counts,
            author_trust,
        })
    }
}

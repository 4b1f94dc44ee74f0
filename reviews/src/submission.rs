//! Review submission pipeline.
//!
//! A submission moves through the stages below in order and stops at the
//! first failure. Nothing is written until the final stage, and that stage is
//! a single store transaction.

use std::sync::Arc;

use tracing::{debug, info, warn};
use vouch_geo::ProximityCheck;
use vouch_ledger::Session;
use vouch_store::{NewReview, PlaceRecord, ReviewRecord, StoreError, VouchStore};
use vouch_types::{
    AccessTier, Clock, Coordinates, IdentityKey, PlaceId, PolicyParams, Rating, ReviewId, Tag,
    VouchError,
};

/// Longest accepted idempotency key.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// The last stage a submission completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SubmissionStage {
    Received,
    AuthValidated,
    ContentValidated,
    LocationFetched,
    ProximityChecked,
    Persisted,
}

/// A review as submitted by a client. Fields the client omitted are `None`.
#[derive(Clone, Debug, Default)]
pub struct ReviewSubmission {
    pub place_id: Option<String>,
    pub content: Option<String>,
    pub rating: Option<f64>,
    pub tags: Vec<String>,
    pub user_lat: Option<f64>,
    pub user_lng: Option<f64>,
    /// Retries carrying the same key return the first review instead of
    /// creating another.
    pub idempotency_key: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubmissionOutcome {
    pub review: ReviewRecord,
    /// True when an earlier submission with the same idempotency key was returned.
    pub duplicate: bool,
}

struct ValidatedContent {
    place_id: PlaceId,
    content: String,
    rating: Option<Rating>,
    tags: Vec<Tag>,
    submission_key: Option<String>,
}

pub struct ReviewPipeline<S, C> {
    store: Arc<S>,
    clock: C,
    params: PolicyParams,
}

impl<S: VouchStore, C: Clock> ReviewPipeline<S, C> {
    pub fn new(store: Arc<S>, clock: C, params: PolicyParams) -> Self {
        Self {
            store,
            clock,
            params,
        }
    }

    pub fn submit(
        &self,
        session: &Session,
        submission: ReviewSubmission,
    ) -> Result<SubmissionOutcome, VouchError> {
        let mut stage = SubmissionStage::Received;
        let result = self.run(session, submission, &mut stage);
        match &result {
            Ok(outcome) => info!(
                review_id = %outcome.review.id,
                place_id = %outcome.review.place_id,
                duplicate = outcome.duplicate,
                "review persisted"
            ),
            Err(VouchError::TooFar {
                distance_m,
                radius_m,
            }) => warn!(distance_m, radius_m, "review rejected: too far from place"),
            Err(e) => debug!(stage = ?stage, reason = e.kind(), "review rejected"),
        }
        result
    }

    fn run(
        &self,
        session: &Session,
        submission: ReviewSubmission,
        stage: &mut SubmissionStage,
    ) -> Result<SubmissionOutcome, VouchError> {
        let author = authorize(session)?;
        *stage = SubmissionStage::AuthValidated;

        let device = required_coordinates(&submission)?;
        let content = self.validate_content(submission)?;
        *stage = SubmissionStage::ContentValidated;

        let device = Coordinates::new(device.0, device.1)?;
        *stage = SubmissionStage::LocationFetched;

        let place = self.find_place(&content.place_id)?;
        let check = ProximityCheck::between(
            device,
            place.coordinates(),
            self.params.proximity_radius_m,
        );
        if !check.in_range() {
            return Err(VouchError::TooFar {
                distance_m: check.distance_m,
                radius_m: check.radius_m,
            });
        }
        *stage = SubmissionStage::ProximityChecked;

        let outcome = self.persist(author, content)?;
        *stage = SubmissionStage::Persisted;
        Ok(outcome)
    }

    fn validate_content(
        &self,
        submission: ReviewSubmission,
    ) -> Result<ValidatedContent, VouchError> {
        let (Some(place_id), Some(content)) = (submission.place_id, submission.content) else {
            return Err(missing_fields());
        };
        if place_id.is_empty() {
            return Err(missing_fields());
        }

        let chars = content.chars().count();
        if chars < self.params.min_content_chars || chars > self.params.max_content_chars {
            return Err(VouchError::InvalidInput(format!(
                "Review must be between {} and {} characters",
                self.params.min_content_chars, self.params.max_content_chars
            )));
        }

        let rating = submission.rating.map(Rating::from_f64).transpose()?;
        let tags = Tag::parse_set(&submission.tags)?;

        if let Some(key) = &submission.idempotency_key {
            if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
                return Err(VouchError::InvalidInput(format!(
                    "idempotency_key must be between 1 and {MAX_IDEMPOTENCY_KEY_LEN} characters"
                )));
            }
        }

        // An unparsable id cannot name a place.
        let place_id =
            PlaceId::parse(&place_id).map_err(|_| VouchError::NotFound("Place".into()))?;

        Ok(ValidatedContent {
            place_id,
            content,
            rating,
            tags,
            submission_key: submission.idempotency_key,
        })
    }

    fn find_place(&self, id: &PlaceId) -> Result<PlaceRecord, VouchError> {
        self.store
            .get_place(id)?
            .ok_or_else(|| VouchError::NotFound("Place".into()))
    }

    fn persist(
        &self,
        author: IdentityKey,
        content: ValidatedContent,
    ) -> Result<SubmissionOutcome, VouchError> {
        let review = NewReview {
            id: ReviewId::generate()?,
            place_id: content.place_id,
            author,
            content: content.content,
            rating: content.rating,
            tags: content.tags,
            created_at: self.clock.now(),
            submission_key: content.submission_key,
        };
        match self.store.insert_review(&review) {
            Ok(inserted) => Ok(SubmissionOutcome {
                duplicate: inserted.is_duplicate(),
                review: inserted.record().clone(),
            }),
            // The author's row vanished after the session resolved.
            Err(StoreError::NotFound(_)) => Err(VouchError::Unauthenticated),
            Err(e) => Err(e.into()),
        }
    }
}

fn authorize(session: &Session) -> Result<IdentityKey, VouchError> {
    let user = session.require_user()?;
    if user.access_tier != AccessTier::Orb {
        return Err(VouchError::Forbidden(
            "Only Orb-verified users can post reviews".into(),
        ));
    }
    Ok(user.identity_key.clone())
}

fn required_coordinates(submission: &ReviewSubmission) -> Result<(f64, f64), VouchError> {
    match (submission.user_lat, submission.user_lng) {
        (Some(lat), Some(lng)) => Ok((lat, lng)),
        _ => Err(missing_fields()),
    }
}

fn missing_fields() -> VouchError {
    VouchError::InvalidInput("Missing required fields".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vouch_nullables::{NullClock, NullStore};
    use vouch_store::{PlaceStore, ReviewStore, UserStore, UserUpsert};
    use vouch_types::{Category, Timestamp};

    const PLACE_LAT: f64 = 37.5665;
    const PLACE_LNG: f64 = 126.9780;
    /// Meters per degree of latitude on the haversine sphere.
    const M_PER_DEG: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

    struct Fixture {
        store: Arc<NullStore>,
        pipeline: ReviewPipeline<NullStore, NullClock>,
        place: PlaceId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(NullStore::new());
        let place = PlaceId::new([7; 16]);
        store
            .put_place(&PlaceRecord {
                id: place,
                name: "Cafe".into(),
                name_local: None,
                latitude: PLACE_LAT,
                longitude: PLACE_LNG,
                category: Category::Cafe,
                external_map_id: None,
                address: None,
            })
            .unwrap();
        let pipeline = ReviewPipeline::new(
            Arc::clone(&store),
            NullClock::new(10_000),
            PolicyParams::default(),
        );
        Fixture {
            store,
            pipeline,
            place,
        }
    }

    fn session(store: &NullStore, key: &str, tier: AccessTier) -> Session {
        let user = store
            .upsert_user(
                &UserUpsert {
                    identity_key: IdentityKey::parse(key).unwrap(),
                    wallet_address: None,
                    access_tier: tier,
                },
                Timestamp::new(1),
            )
            .unwrap();
        Session::Authenticated(user)
    }

    fn submission(place: PlaceId, meters_north: f64) -> ReviewSubmission {
        ReviewSubmission {
            place_id: Some(place.to_hex()),
            content: Some("Great coffee, English menu available".into()),
            rating: Some(4.0),
            tags: vec!["english_menu".into(), "card_ok".into()],
            user_lat: Some(PLACE_LAT + meters_north / M_PER_DEG),
            user_lng: Some(PLACE_LNG),
            idempotency_key: None,
        }
    }

    #[test]
    fn test_orb_user_in_range_persists_review() {
        let f = fixture();
        let s = session(&f.store, "0xorb", AccessTier::Orb);
        let outcome = f.pipeline.submit(&s, submission(f.place, 10.0)).unwrap();
        assert!(!outcome.duplicate);
        assert_eq!(outcome.review.author.as_ref().unwrap().as_str(), "0xorb");
        assert_eq!(outcome.review.rating, Some(Rating::new(4).unwrap()));
        assert_eq!(outcome.review.tags, vec![Tag::EnglishMenu, Tag::CardOk]);
        assert_eq!(outcome.review.created_at, Timestamp::new(10_000));
        let user = f.store.get_user(&IdentityKey::parse("0xorb").unwrap()).unwrap().unwrap();
        assert_eq!(user.review_count, 1);
    }

    #[test]
    fn test_anonymous_and_stale_sessions_are_unauthenticated() {
        let f = fixture();
        for s in [Session::Anonymous, Session::Stale] {
            assert!(matches!(
                f.pipeline.submit(&s, submission(f.place, 0.0)),
                Err(VouchError::Unauthenticated)
            ));
        }
    }

    #[test]
    fn test_paid_user_cannot_post() {
        let f = fixture();
        let s = session(&f.store, "paid_0xw", AccessTier::Paid);
        assert!(matches!(
            f.pipeline.submit(&s, submission(f.place, 0.0)),
            Err(VouchError::Forbidden(_))
        ));
    }

    #[test]
    fn test_content_length_bounds() {
        let f = fixture();
        let s = session(&f.store, "0xorb", AccessTier::Orb);
        for (len, ok) in [(0, false), (1, true), (500, true), (501, false)] {
            let mut sub = submission(f.place, 0.0);
            sub.content = Some("가".repeat(len));
            let result = f.pipeline.submit(&s, sub);
            assert_eq!(result.is_ok(), ok, "length {len}");
            if !ok {
                assert!(matches!(result, Err(VouchError::InvalidInput(_))));
            }
        }
    }

    #[test]
    fn test_rating_must_be_integer_in_range() {
        let f = fixture();
        let s = session(&f.store, "0xorb", AccessTier::Orb);
        for rating in [0.0, 6.0, 3.5, f64::NAN] {
            let mut sub = submission(f.place, 0.0);
            sub.rating = Some(rating);
            assert!(matches!(
                f.pipeline.submit(&s, sub),
                Err(VouchError::InvalidInput(_))
            ));
        }
        for rating in 1..=5 {
            let mut sub = submission(f.place, 0.0);
            sub.rating = Some(f64::from(rating));
            assert!(f.pipeline.submit(&s, sub).is_ok());
        }
        let mut sub = submission(f.place, 0.0);
        sub.rating = None;
        assert_eq!(f.pipeline.submit(&s, sub).unwrap().review.rating, None);
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let f = fixture();
        let s = session(&f.store, "0xorb", AccessTier::Orb);
        let mut sub = submission(f.place, 0.0);
        sub.tags = vec!["great_vibes".into()];
        assert!(matches!(
            f.pipeline.submit(&s, sub),
            Err(VouchError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_fields() {
        let f = fixture();
        let s = session(&f.store, "0xorb", AccessTier::Orb);
        let mut no_coords = submission(f.place, 0.0);
        no_coords.user_lng = None;
        let mut no_place = submission(f.place, 0.0);
        no_place.place_id = None;
        for sub in [no_coords, no_place] {
            match f.pipeline.submit(&s, sub) {
                Err(VouchError::InvalidInput(msg)) => assert_eq!(msg, "Missing required fields"),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_out_of_range_coordinates_are_invalid() {
        let f = fixture();
        let s = session(&f.store, "0xorb", AccessTier::Orb);
        let mut sub = submission(f.place, 0.0);
        sub.user_lat = Some(91.0);
        assert!(matches!(
            f.pipeline.submit(&s, sub),
            Err(VouchError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unknown_place_is_not_found() {
        let f = fixture();
        let s = session(&f.store, "0xorb", AccessTier::Orb);
        let mut sub = submission(PlaceId::new([8; 16]), 0.0);
        assert!(matches!(
            f.pipeline.submit(&s, sub.clone()),
            Err(VouchError::NotFound(_))
        ));
        sub.place_id = Some("not-an-id".into());
        assert!(matches!(
            f.pipeline.submit(&s, sub),
            Err(VouchError::NotFound(_))
        ));
    }

    #[test]
    fn test_proximity_boundary() {
        let f = fixture();
        let s = session(&f.store, "0xorb", AccessTier::Orb);
        assert!(f.pipeline.submit(&s, submission(f.place, 50.0)).is_ok());
        match f.pipeline.submit(&s, submission(f.place, 51.0)) {
            Err(VouchError::TooFar {
                distance_m,
                radius_m,
            }) => {
                assert_eq!(distance_m, 51);
                assert_eq!(radius_m, 50);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rejection_writes_nothing() {
        let f = fixture();
        let s = session(&f.store, "0xorb", AccessTier::Orb);
        let _ = f.pipeline.submit(&s, submission(f.place, 500.0));
        let key = IdentityKey::parse("0xorb").unwrap();
        assert_eq!(f.store.get_user(&key).unwrap().unwrap().review_count, 0);
        assert!(f.store.reviews_for_place(&f.place).unwrap().is_empty());
    }

    #[test]
    fn test_idempotency_key_returns_first_review() {
        let f = fixture();
        let s = session(&f.store, "0xorb", AccessTier::Orb);
        let mut sub = submission(f.place, 0.0);
        sub.idempotency_key = Some("tap-1".into());
        let first = f.pipeline.submit(&s, sub.clone()).unwrap();
        let second = f.pipeline.submit(&s, sub).unwrap();
        assert!(second.duplicate);
        assert_eq!(first.review.id, second.review.id);
        assert_eq!(f.store.reviews_for_place(&f.place).unwrap().len(), 1);

        let mut bad = submission(f.place, 0.0);
        bad.idempotency_key = Some(String::new());
        assert!(matches!(
            f.pipeline.submit(&s, bad),
            Err(VouchError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_without_key_duplicates_are_accepted() {
        let f = fixture();
        let s = session(&f.store, "0xorb", AccessTier::Orb);
        f.pipeline.submit(&s, submission(f.place, 0.0)).unwrap();
        f.pipeline.submit(&s, submission(f.place, 0.0)).unwrap();
        assert_eq!(f.store.reviews_for_place(&f.place).unwrap().len(), 2);
    }

    #[test]
    fn test_store_failure_is_internal() {
        let f = fixture();
        let s = session(&f.store, "0xorb", AccessTier::Orb);
        f.store.set_failing(true);
        assert!(matches!(
            f.pipeline.submit(&s, submission(f.place, 0.0)),
            Err(VouchError::Internal(_))
        ));
    }
}

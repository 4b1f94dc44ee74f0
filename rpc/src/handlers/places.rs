//! Place listing and per-place review listing.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use vouch_store::{PlaceRecord, VouchStore};
use vouch_types::{PlaceId, VouchError};

use super::{with_session, ReviewView, VoteView};
use crate::error::Envelope;
use crate::state::AppState;

/// GET /api/places
pub async fn list_places<S: VouchStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Response {
    let resolved = with_session(&state, &headers, |st, session| {
        if st.config.places_require_auth {
            session.require_user()?;
        }
        Ok(st.store.list_places()?)
    })
    .await;
    resolved.respond(&state.config, Envelope::Plain, |places| {
        Json(places).into_response()
    })
}

#[derive(Serialize)]
struct ListedReview {
    #[serde(flatten)]
    review: ReviewView,
    #[serde(rename = "isOwnReview")]
    is_own_review: bool,
    /// Content was withheld because the viewer has no session.
    redacted: bool,
}

#[derive(Serialize)]
struct PlaceWithReviews {
    #[serde(flatten)]
    place: PlaceRecord,
    reviews: Vec<ListedReview>,
    #[serde(rename = "userVotes")]
    user_votes: Vec<VoteView>,
    #[serde(rename = "isAuthenticated")]
    is_authenticated: bool,
}

/// GET /api/places/:id/reviews
///
/// Anonymous viewers get every review with its content withheld. Author
/// identity keys are never listed; `isOwnReview` marks the viewer's own.
pub async fn place_reviews<S: VouchStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let resolved = with_session(&state, &headers, move |st, session| {
        let place_id = PlaceId::parse(&id).map_err(|_| VouchError::NotFound("Place".into()))?;
        let place = st
            .store
            .get_place(&place_id)?
            .ok_or_else(|| VouchError::NotFound("Place".into()))?;
        let reviews = st.store.reviews_for_place(&place_id)?;

        let viewer = session.user();
        let redact = !session.viewer_tier().can_read_full();
        let user_votes = match viewer {
            Some(user) => {
                let ids: Vec<_> = reviews.iter().map(|r| r.id).collect();
                st.store.votes_by_voter(&user.identity_key, &ids)?
            }
            None => Vec::new(),
        };

        let reviews = reviews
            .into_iter()
            .map(|r| {
                let is_own_review = viewer.is_some_and(|u| r.is_authored_by(&u.identity_key));
                let mut review = ReviewView::from(r);
                // The identity key doubles as the unsigned session credential.
                review.author = None;
                if redact {
                    review.content.clear();
                }
                ListedReview {
                    review,
                    is_own_review,
                    redacted: redact,
                }
            })
            .collect();

        Ok(PlaceWithReviews {
            place,
            reviews,
            user_votes: user_votes.into_iter().map(VoteView::from).collect(),
            is_authenticated: viewer.is_some(),
        })
    })
    .await;
    resolved.respond(&state.config, Envelope::Plain, |body| {
        Json(body).into_response()
    })
}

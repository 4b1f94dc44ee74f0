//! The caller's own profile.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use vouch_store::VouchStore;
use vouch_types::{PlaceId, Rating, Timestamp};

use super::{with_session, ProfileUser, UserSummary};
use crate::error::Envelope;
use crate::state::AppState;

#[derive(Serialize)]
struct ProfileStats {
    review_count: u64,
    helpful_votes_received: u64,
}

#[derive(Serialize)]
struct ProfileReview {
    id: String,
    content: String,
    rating: Option<Rating>,
    helpful_count: u64,
    not_helpful_count: u64,
    created_at: Timestamp,
    /// `None` when the place has since been removed.
    place_name: Option<String>,
}

#[derive(Serialize)]
struct Profile {
    user: ProfileUser,
    stats: ProfileStats,
    reviews: Vec<ProfileReview>,
}

/// GET /api/user/profile
pub async fn profile<S: VouchStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Response {
    let resolved = with_session(&state, &headers, |st, session| {
        let user = session.require_user()?;
        let reviews = st.store.reviews_by_author(&user.identity_key)?;

        let mut place_names: HashMap<PlaceId, Option<String>> = HashMap::new();
        let mut profile_reviews = Vec::with_capacity(reviews.len());
        for r in reviews {
            let place_name = match place_names.get(&r.place_id) {
                Some(name) => name.clone(),
                None => {
                    let name = st.store.get_place(&r.place_id)?.map(|p| p.name);
                    place_names.insert(r.place_id, name.clone());
                    name
                }
            };
            profile_reviews.push(ProfileReview {
                id: r.id.to_hex(),
                content: r.content,
                rating: r.rating,
                helpful_count: r.helpful_count,
                not_helpful_count: r.not_helpful_count,
                created_at: r.created_at,
                place_name,
            });
        }

        Ok(Profile {
            user: ProfileUser {
                summary: UserSummary::from(user),
                trust_tier: user.trust_score.tier(),
                access_tier: user.access_tier,
                created_at: user.created_at,
            },
            stats: ProfileStats {
                review_count: user.review_count,
                helpful_votes_received: profile_reviews.iter().map(|r| r.helpful_count).sum(),
            },
            reviews: profile_reviews,
        })
    })
    .await;
    resolved.respond(&state.config, Envelope::Plain, |profile| {
        Json(profile).into_response()
    })
}

//! Review submission and helpfulness votes.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use vouch_reviews::ReviewSubmission;
use vouch_store::VouchStore;
use vouch_types::{ReviewId, VouchError};

use super::{with_session, ReviewView, VoteView};
use crate::error::{Envelope, RpcError};
use crate::metrics::{ApiMetrics, ACCEPTED};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateReviewBody {
    pub place_id: Option<String>,
    pub content: Option<String>,
    /// Kept loose so a non-numeric rating gets the rating error, not a parse error.
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub user_lat: Option<f64>,
    pub user_lng: Option<f64>,
    pub idempotency_key: Option<String>,
}

impl CreateReviewBody {
    fn into_submission(self) -> Result<ReviewSubmission, VouchError> {
        let rating = match self.rating {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => n.as_f64(),
            Some(_) => {
                return Err(VouchError::InvalidInput(
                    "Rating must be an integer between 1 and 5".into(),
                ))
            }
        };
        Ok(ReviewSubmission {
            place_id: self.place_id,
            content: self.content,
            rating,
            tags: self.tags.unwrap_or_default(),
            user_lat: self.user_lat,
            user_lng: self.user_lng,
            idempotency_key: self.idempotency_key,
        })
    }
}

/// POST /api/reviews
pub async fn create_review<S: VouchStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    body: Result<Json<CreateReviewBody>, JsonRejection>,
) -> Response {
    let body = body.map_err(|e| RpcError::InvalidRequest(e.body_text()));
    let resolved = with_session(&state, &headers, move |st, session| {
        // Authentication is reported ahead of any body problem.
        session.require_user()?;
        let submission = match body {
            Ok(Json(body)) => body.into_submission()?,
            Err(e) => return Err(VouchError::InvalidInput(e.to_string())),
        };
        st.pipeline.submit(session, submission)
    })
    .await;

    match &resolved.result {
        Ok(_) => ApiMetrics::record(&state.metrics.reviews, ACCEPTED),
        Err(e) => {
            ApiMetrics::record(&state.metrics.reviews, e.kind());
            if let RpcError::Vouch(VouchError::TooFar { distance_m, .. }) = e {
                state
                    .metrics
                    .rejected_review_distance_m
                    .observe(*distance_m as f64);
            }
        }
    }

    resolved.respond(&state.config, Envelope::Success, |outcome| {
        Json(json!({
            "success": true,
            "duplicate": outcome.duplicate,
            "review": ReviewView::from(outcome.review),
        }))
        .into_response()
    })
}

#[derive(Deserialize)]
pub struct VoteBody {
    #[serde(default)]
    pub is_helpful: Option<Value>,
}

/// POST /api/reviews/:id/vote
pub async fn vote<S: VouchStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<VoteBody>, JsonRejection>,
) -> Response {
    let is_helpful = match body {
        Ok(Json(VoteBody {
            is_helpful: Some(Value::Bool(b)),
        })) => Ok(b),
        _ => Err(VouchError::InvalidInput("is_helpful must be a boolean".into())),
    };
    let resolved = with_session(&state, &headers, move |st, session| {
        session.require_user()?;
        let is_helpful = is_helpful?;
        let review_id = ReviewId::parse(&id).map_err(|_| VouchError::NotFound("Review".into()))?;
        st.votes.submit_vote(session, &review_id, is_helpful)
    })
    .await;

    let outcome = match &resolved.result {
        Ok(_) => ACCEPTED,
        Err(e) => e.kind(),
    };
    ApiMetrics::record(&state.metrics.votes, outcome);

    resolved.respond(&state.config, Envelope::Plain, |outcome| {
        Json(json!({
            "success": true,
            "vote": VoteView::from(outcome.vote),
            "review": {
                "helpful_count": outcome.counts.helpful,
                "not_helpful_count": outcome.counts.not_helpful,
            },
        }))
        .into_response()
    })
}

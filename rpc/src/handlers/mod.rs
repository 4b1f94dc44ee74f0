//! HTTP request handlers.
//!
//! Store work runs on the blocking pool. Every handler that reads the `auth`
//! cookie goes through [`with_session`], which also expires the cookie when
//! it names no known user.

pub mod auth;
pub mod places;
pub mod profile;
pub mod reviews;

use std::sync::Arc;

use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use serde::Serialize;
use tracing::warn;
use vouch_ledger::Session;
use vouch_store::{ReviewRecord, UserRecord, VoteRecord, VouchStore};
use vouch_types::ids::random_bytes16;
use vouch_types::{AccessTier, IdentityKey, Rating, ReviewSource, Tag, Timestamp, TrustTier};

use crate::cookie::{self, AUTH_COOKIE};
use crate::error::{Envelope, RpcError};
use crate::state::{ApiConfig, AppState};

/// The outcome of a handler's blocking work, plus whether the presented
/// credential was stale.
pub(crate) struct Resolved<T> {
    pub(crate) stale: bool,
    pub(crate) result: Result<T, RpcError>,
}

impl<T> Resolved<T> {
    pub(crate) fn respond(
        self,
        config: &ApiConfig,
        envelope: Envelope,
        ok: impl FnOnce(T) -> Response,
    ) -> Response {
        let mut response = match self.result {
            Ok(value) => ok(value),
            Err(e) => e.into_response_with(envelope),
        };
        if self.stale {
            append_cookie(&mut response, cookie::expire(AUTH_COOKIE, config.secure_cookies));
        }
        response
    }
}

/// Resolve the caller's session and run `work` with it on the blocking pool.
pub(crate) async fn with_session<S, T, F>(
    state: &Arc<AppState<S>>,
    headers: &HeaderMap,
    work: F,
) -> Resolved<T>
where
    S: VouchStore + 'static,
    T: Send + 'static,
    F: FnOnce(&AppState<S>, &Session) -> Result<T, vouch_types::VouchError> + Send + 'static,
{
    let credential = cookie::read(headers, AUTH_COOKIE);
    let state = Arc::clone(state);
    let joined = tokio::task::spawn_blocking(move || {
        let session = state.sessions.resolve(credential.as_deref())?;
        Ok::<_, vouch_types::VouchError>((session.is_stale(), work(&state, &session)))
    })
    .await;
    match joined {
        Ok(Ok((stale, result))) => Resolved {
            stale,
            result: result.map_err(RpcError::from),
        },
        Ok(Err(e)) => Resolved {
            stale: false,
            result: Err(e.into()),
        },
        Err(e) => Resolved {
            stale: false,
            result: Err(RpcError::Task(e.to_string())),
        },
    }
}

/// Run store work that needs no session on the blocking pool.
pub(crate) async fn blocking<S, T, F>(state: &Arc<AppState<S>>, work: F) -> Result<T, RpcError>
where
    S: VouchStore + 'static,
    T: Send + 'static,
    F: FnOnce(&AppState<S>) -> Result<T, vouch_types::VouchError> + Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || work(&state))
        .await
        .map_err(|e| RpcError::Task(e.to_string()))?
        .map_err(RpcError::from)
}

pub(crate) fn append_cookie(response: &mut Response, value: String) {
    match HeaderValue::from_str(&value) {
        Ok(v) => {
            response.headers_mut().append(SET_COOKIE, v);
        }
        Err(e) => warn!(error = %e, "dropping unrenderable cookie"),
    }
}

/// 16 random bytes as 32 lowercase hex chars.
pub(crate) fn random_reference() -> Result<String, RpcError> {
    Ok(hex::encode(random_bytes16()?))
}

// ── Views ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub(crate) struct UserSummary {
    pub nullifier_hash: IdentityKey,
    pub trust_score: u8,
    pub review_count: u64,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            nullifier_hash: user.identity_key.clone(),
            trust_score: user.trust_score.value(),
            review_count: user.review_count,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct ProfileUser {
    #[serde(flatten)]
    pub summary: UserSummary,
    pub trust_tier: TrustTier,
    pub access_tier: AccessTier,
    pub created_at: Timestamp,
}

#[derive(Serialize)]
pub(crate) struct ReviewView {
    pub id: String,
    pub place_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<IdentityKey>,
    pub content: String,
    pub rating: Option<Rating>,
    pub tags: Vec<Tag>,
    pub helpful_count: u64,
    pub not_helpful_count: u64,
    pub source: ReviewSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_author: Option<String>,
    pub created_at: Timestamp,
}

impl From<ReviewRecord> for ReviewView {
    fn from(r: ReviewRecord) -> Self {
        let (original_platform, original_author) = match r.provenance {
            Some(p) => (Some(p.original_platform), p.original_author),
            None => (None, None),
        };
        Self {
            id: r.id.to_hex(),
            place_id: r.place_id.to_hex(),
            author: r.author,
            content: r.content,
            rating: r.rating,
            tags: r.tags,
            helpful_count: r.helpful_count,
            not_helpful_count: r.not_helpful_count,
            source: r.source,
            original_platform,
            original_author,
            created_at: r.created_at,
        }
    }
}

#[derive(Serialize)]
pub(crate) struct VoteView {
    pub id: String,
    pub review_id: String,
    pub is_helpful: bool,
}

impl From<VoteRecord> for VoteView {
    fn from(v: VoteRecord) -> Self {
        Self {
            id: v.id.to_hex(),
            review_id: v.review_id.to_hex(),
            is_helpful: v.is_helpful,
        }
    }
}

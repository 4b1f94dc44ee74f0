//! Session, verification, and payment endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use vouch_store::VouchStore;
use vouch_types::{AccessTier, VouchError, WalletAddress};
use vouch_verification::{ProofPayload, UpstreamError};

use super::{append_cookie, blocking, random_reference, with_session, UserSummary};
use crate::cookie::{self, SameSite, SetCookie, AUTH_COOKIE, NONCE_COOKIE, NONCE_MAX_AGE_SECS};
use crate::error::{Envelope, RpcError};
use crate::metrics::{ApiMetrics, ACCEPTED};
use crate::state::AppState;

/// GET /api/auth/check
pub async fn check<S: VouchStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Response {
    let resolved = with_session(&state, &headers, |_, session| Ok(session.user().cloned())).await;
    resolved.respond(&state.config, Envelope::Plain, |user| match user {
        None => Json(json!({ "authenticated": false })).into_response(),
        Some(user) => Json(json!({
            "authenticated": true,
            "access_tier": user.access_tier,
            "user": UserSummary::from(&user),
        }))
        .into_response(),
    })
}

#[derive(Deserialize)]
pub struct VerifyBody {
    pub payload: Option<ProofPayload>,
    pub action: Option<String>,
}

/// POST /api/auth/verify
pub async fn verify<S: VouchStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<VerifyBody>, JsonRejection>,
) -> Response {
    let result = verify_inner(&state, body).await;
    let outcome = match &result {
        Ok(_) => ACCEPTED,
        Err(e) => e.kind(),
    };
    ApiMetrics::record(&state.metrics.verifications, outcome);
    match result {
        Ok(response) => response,
        Err(e) => e.into_response_with(Envelope::Verified),
    }
}

async fn verify_inner<S: VouchStore + 'static>(
    state: &Arc<AppState<S>>,
    body: Result<Json<VerifyBody>, JsonRejection>,
) -> Result<Response, RpcError> {
    let Json(body) = body.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
    let (Some(payload), Some(action)) = (body.payload, body.action.filter(|a| !a.is_empty()))
    else {
        return Err(VouchError::InvalidInput("Missing required fields".into()).into());
    };

    let verification = tokio::time::timeout(
        state.config.upstream_timeout,
        state.verifier.verify_proof(&payload, &action),
    )
    .await
    .unwrap_or(Err(UpstreamError::Timeout));
    let subject = match verification {
        Ok(subject) => subject,
        Err(UpstreamError::Rejected { code, detail }) => {
            warn!(verifier = state.verifier.name(), code = %code, "proof rejected");
            return Err(RpcError::Verification { code, detail });
        }
        Err(e) => {
            warn!(verifier = state.verifier.name(), error = %e, "proof verification failed");
            return Err(VouchError::from(e).into());
        }
    };

    let user = blocking(state, move |st| st.identities.upsert_verified(&subject.subject_id)).await?;
    info!(identity = %user.identity_key, "user verified");

    let mut response = Json(json!({
        "verified": true,
        "user": UserSummary::from(&user),
    }))
    .into_response();
    set_auth_cookie(state, &mut response, &user.identity_key, AccessTier::Orb);
    Ok(response)
}

#[derive(Deserialize)]
pub struct PaymentBody {
    pub transaction_id: Option<String>,
    pub reference: Option<String>,
}

/// POST /api/auth/payment
pub async fn payment<S: VouchStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<PaymentBody>, JsonRejection>,
) -> Response {
    let result = payment_inner(&state, body).await;
    let outcome = match &result {
        Ok(_) => ACCEPTED,
        Err(e) => e.kind(),
    };
    ApiMetrics::record(&state.metrics.payments, outcome);
    match result {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

async fn payment_inner<S: VouchStore + 'static>(
    state: &Arc<AppState<S>>,
    body: Result<Json<PaymentBody>, JsonRejection>,
) -> Result<Response, RpcError> {
    let Json(body) = body.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
    let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());
    let (Some(transaction_id), Some(reference)) =
        (non_empty(body.transaction_id), non_empty(body.reference))
    else {
        return Err(VouchError::InvalidInput("Missing transaction_id or reference".into()).into());
    };

    let tx = tokio::time::timeout(
        state.config.upstream_timeout,
        state.payments.transaction_status(&transaction_id),
    )
    .await
    .unwrap_or(Err(UpstreamError::Timeout))
    .map_err(|e| {
        warn!(transaction_id = %transaction_id, error = %e, "payment lookup failed");
        VouchError::from(e)
    })?;
    if tx.reference != reference {
        return Err(VouchError::InvalidInput("Transaction reference mismatch".into()).into());
    }
    if !tx.is_mined() {
        return Err(VouchError::InvalidInput(format!(
            "Transaction not completed (status: {})",
            tx.status
        ))
        .into());
    }
    let wallet = WalletAddress::parse(tx.from.as_str()).map_err(|_| {
        VouchError::UpstreamVerificationFailed("Payment verification failed".into())
    })?;

    let user = blocking(state, move |st| st.identities.upsert_paid(wallet)).await?;
    info!(identity = %user.identity_key, transaction_id = %transaction_id, "payment accepted");

    let mut response = Json(json!({
        "success": true,
        "access_tier": AccessTier::Paid,
    }))
    .into_response();
    set_auth_cookie(state, &mut response, &user.identity_key, AccessTier::Paid);
    Ok(response)
}

/// POST /api/auth/initiate-payment
pub async fn initiate_payment() -> Response {
    match random_reference() {
        Ok(id) => Json(json!({ "id": id })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /api/auth/nonce
pub async fn nonce<S: VouchStore + 'static>(State(state): State<Arc<AppState<S>>>) -> Response {
    let nonce = match random_reference() {
        Ok(nonce) => nonce,
        Err(e) => return e.into_response(),
    };
    let mut response = Json(json!({ "nonce": nonce })).into_response();
    append_cookie(
        &mut response,
        SetCookie {
            name: NONCE_COOKIE,
            value: &nonce,
            max_age_secs: NONCE_MAX_AGE_SECS,
            same_site: SameSite::Strict,
            secure: state.config.secure_cookies,
        }
        .render(),
    );
    response
}

/// POST /api/auth/signout
pub async fn signout<S: VouchStore + 'static>(State(state): State<Arc<AppState<S>>>) -> Response {
    let mut response = Json(json!({ "success": true })).into_response();
    append_cookie(
        &mut response,
        cookie::expire(AUTH_COOKIE, state.config.secure_cookies),
    );
    response
}

fn set_auth_cookie<S: VouchStore + 'static>(
    state: &AppState<S>,
    response: &mut Response,
    key: &vouch_types::IdentityKey,
    tier: AccessTier,
) {
    let value = state.sessions.credential_for(key);
    append_cookie(
        response,
        SetCookie {
            name: AUTH_COOKIE,
            value: &value,
            max_age_secs: state.sessions.max_age_for(tier),
            same_site: SameSite::Lax,
            secure: state.config.secure_cookies,
        }
        .render(),
    );
}

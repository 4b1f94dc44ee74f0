//! RPC error types and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};
use vouch_types::VouchError;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Vouch(#[from] VouchError),

    /// The proof verifier refused the proof. Rendered with its code and detail.
    #[error("{code}")]
    Verification {
        code: String,
        detail: Option<String>,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("task failed: {0}")]
    Task(String),
}

/// Which success flag an endpoint's error bodies carry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Envelope {
    /// `{ error }`
    #[default]
    Plain,
    /// `{ success: false, error }`
    Success,
    /// `{ verified: false, error }`
    Verified,
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verified: Option<bool>,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance: Option<u64>,
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            RpcError::Vouch(e) => match e {
                VouchError::Unauthenticated => StatusCode::UNAUTHORIZED,
                VouchError::Forbidden(_)
                | VouchError::SelfVoteForbidden
                | VouchError::TooFar { .. } => StatusCode::FORBIDDEN,
                VouchError::InvalidInput(_) | VouchError::UpstreamVerificationFailed(_) => {
                    StatusCode::BAD_REQUEST
                }
                VouchError::NotFound(_) => StatusCode::NOT_FOUND,
                VouchError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                VouchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            RpcError::Verification { .. } | RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::Server(_) | RpcError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RpcError::Vouch(e) => e.kind(),
            RpcError::Verification { .. } => "upstream",
            RpcError::InvalidRequest(_) => "invalid_input",
            RpcError::Server(_) | RpcError::Task(_) => "internal",
        }
    }

    /// The client-visible message. Internal failures stay generic.
    fn message(&self) -> String {
        match self {
            RpcError::Vouch(e) => match e {
                VouchError::Unauthenticated => "Authentication required".into(),
                VouchError::SelfVoteForbidden => "You cannot vote on your own review".into(),
                VouchError::TooFar { radius_m, .. } => {
                    format!("You must be within {radius_m}m of this location to post a review")
                }
                VouchError::RateLimited => "Rate limit exceeded. Try again tomorrow.".into(),
                VouchError::Forbidden(msg)
                | VouchError::InvalidInput(msg)
                | VouchError::UpstreamVerificationFailed(msg) => msg.clone(),
                VouchError::NotFound(_) => e.to_string(),
                VouchError::Internal(_) => "Internal server error".into(),
            },
            RpcError::Verification { code, .. } => code.clone(),
            RpcError::InvalidRequest(msg) => msg.clone(),
            RpcError::Server(_) | RpcError::Task(_) => "Internal server error".into(),
        }
    }

    pub fn into_response_with(self, envelope: Envelope) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let body = ErrorBody {
            success: (envelope == Envelope::Success).then_some(false),
            verified: (envelope == Envelope::Verified).then_some(false),
            error: self.message(),
            detail: match &self {
                RpcError::Verification { detail, .. } => detail.clone(),
                _ => None,
            },
            distance: match &self {
                RpcError::Vouch(VouchError::TooFar { distance_m, .. }) => Some(*distance_m),
                _ => None,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        self.into_response_with(Envelope::Plain)
    }
}

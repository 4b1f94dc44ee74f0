use thiserror::Error;
use vouch_types::VouchError;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The service answered and refused the request.
    #[error("{code}")]
    Rejected {
        code: String,
        detail: Option<String>,
    },

    #[error("upstream request timed out")]
    Timeout,

    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    #[error("malformed upstream response: {0}")]
    Malformed(String),

    #[error("upstream not configured: {0}")]
    NotConfigured(&'static str),

    /// The HTTP client could not be built (TLS backend, resolver).
    #[error("http client unavailable: {0}")]
    Client(String),
}

impl UpstreamError {
    /// Verifier-supplied detail, when the service gave one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            UpstreamError::Rejected { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout
        } else if e.is_decode() {
            UpstreamError::Malformed(e.to_string())
        } else {
            UpstreamError::Unreachable(e.to_string())
        }
    }
}

impl From<UpstreamError> for VouchError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::NotConfigured(what) => {
                VouchError::Internal(format!("{what} not configured"))
            }
            UpstreamError::Client(e) => VouchError::Internal(format!("http client: {e}")),
            other => VouchError::UpstreamVerificationFailed(other.to_string()),
        }
    }
}

//! Shared application state handed to every handler.

use std::sync::Arc;
use std::time::Duration;

use vouch_ledger::{IdentityLedger, SessionResolver, SessionSigner};
use vouch_limiter::RateLimiter;
use vouch_reviews::{ReviewPipeline, VoteEngine};
use vouch_store::VouchStore;
use vouch_types::{Clock, PolicyParams, VouchError};
use vouch_verification::{PaymentOracle, ProofVerifier};

use crate::metrics::ApiMetrics;

/// Deployment options for the HTTP surface.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Mark cookies `Secure` (production).
    pub secure_cookies: bool,
    /// Whether `GET /api/places` rejects anonymous callers.
    pub places_require_auth: bool,
    /// Serve `GET /metrics`.
    pub enable_metrics: bool,
    /// HMAC key for cookie values. Unsigned identity keys when `None`.
    pub session_secret: Option<String>,
    /// Bound on each verifier and payment-oracle call.
    pub upstream_timeout: Duration,
    pub params: PolicyParams,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            secure_cookies: false,
            places_require_auth: true,
            enable_metrics: true,
            session_secret: None,
            upstream_timeout: Duration::from_secs(30),
            params: PolicyParams::default(),
        }
    }
}

/// External collaborators the API calls into.
pub struct Services {
    pub limiter: Arc<dyn RateLimiter>,
    pub verifier: Arc<dyn ProofVerifier>,
    pub payments: Arc<dyn PaymentOracle>,
    pub clock: Arc<dyn Clock>,
}

pub struct AppState<S> {
    pub(crate) store: Arc<S>,
    pub(crate) sessions: SessionResolver<S>,
    pub(crate) identities: IdentityLedger<S, Arc<dyn Clock>>,
    pub(crate) pipeline: ReviewPipeline<S, Arc<dyn Clock>>,
    pub(crate) votes: VoteEngine<S, Arc<dyn Clock>>,
    pub(crate) verifier: Arc<dyn ProofVerifier>,
    pub(crate) payments: Arc<dyn PaymentOracle>,
    pub(crate) metrics: ApiMetrics,
    pub(crate) config: ApiConfig,
}

impl<S: VouchStore + 'static> AppState<S> {
    pub fn new(store: Arc<S>, services: Services, config: ApiConfig) -> Result<Self, VouchError> {
        let signer = config
            .session_secret
            .as_deref()
            .map(|secret| SessionSigner::new(secret.as_bytes()))
            .transpose()?;
        let params = config.params.clone();
        Ok(Self {
            sessions: SessionResolver::new(Arc::clone(&store), signer, params.clone()),
            identities: IdentityLedger::new(Arc::clone(&store), Arc::clone(&services.clock)),
            pipeline: ReviewPipeline::new(
                Arc::clone(&store),
                Arc::clone(&services.clock),
                params.clone(),
            ),
            votes: VoteEngine::new(
                Arc::clone(&store),
                services.limiter,
                Arc::clone(&services.clock),
                params,
            ),
            store,
            verifier: services.verifier,
            payments: services.payments,
            metrics: ApiMetrics::new(),
            config,
        })
    }

    pub fn metrics(&self) -> &ApiMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

//! HTTP clients for the World developer portal.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    PaymentOracle, ProofPayload, ProofVerifier, TransactionStatus, UpstreamError, VerifiedSubject,
};

pub const DEFAULT_BASE_URL: &str = "https://developer.worldcoin.org";

/// Connection settings shared by both clients.
#[derive(Debug, Clone)]
pub struct WorldClientConfig {
    pub app_id: Option<String>,
    /// Developer portal API key, sent as a bearer token to the payment lookup.
    pub api_key: Option<String>,
    pub base_url: String,
    /// Whole-request timeout (default: 30 seconds).
    pub timeout: Duration,
}

impl Default for WorldClientConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl WorldClientConfig {
    fn app_id(&self) -> Result<&str, UpstreamError> {
        self.app_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or(UpstreamError::NotConfigured("app id"))
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    fn http_client(&self) -> Result<reqwest::Client, UpstreamError> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("vouch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))
    }
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    nullifier_hash: &'a str,
    merkle_root: &'a str,
    proof: &'a str,
    verification_level: &'a str,
    action: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    signal_hash: Option<&'a str>,
}

#[derive(Default, Deserialize)]
struct VerifyRejection {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Cloud verification of World ID proofs.
pub struct WorldIdVerifier {
    config: WorldClientConfig,
    http: reqwest::Client,
}

impl WorldIdVerifier {
    pub fn new(config: WorldClientConfig) -> Result<Self, UpstreamError> {
        let http = config.http_client()?;
        Ok(Self { config, http })
    }

    fn verify_url(&self, app_id: &str) -> String {
        format!("{}/api/v2/verify/{}", self.config.base(), app_id)
    }
}

#[async_trait]
impl ProofVerifier for WorldIdVerifier {
    fn name(&self) -> &str {
        "world-id"
    }

    async fn verify_proof(
        &self,
        payload: &ProofPayload,
        action: &str,
    ) -> Result<VerifiedSubject, UpstreamError> {
        let app_id = self.config.app_id()?;
        let body = VerifyRequest {
            nullifier_hash: &payload.nullifier_hash,
            merkle_root: &payload.merkle_root,
            proof: &payload.proof,
            verification_level: &payload.verification_level,
            action,
            signal_hash: payload.signal_hash.as_deref(),
        };

        let resp = self
            .http
            .post(self.verify_url(app_id))
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            debug!(action, "proof accepted");
            return Ok(VerifiedSubject {
                subject_id: payload.nullifier_hash.clone(),
            });
        }

        let rejection: VerifyRejection = resp.json().await.unwrap_or_default();
        warn!(
            action,
            status = status.as_u16(),
            code = rejection.code.as_deref().unwrap_or("-"),
            "proof rejected by verifier"
        );
        Err(UpstreamError::Rejected {
            code: rejection
                .code
                .unwrap_or_else(|| "Verification failed".to_string()),
            detail: rejection.detail,
        })
    }
}

/// Payment-status lookup against the mini-app transaction API.
pub struct WorldPaymentOracle {
    config: WorldClientConfig,
    http: reqwest::Client,
}

impl WorldPaymentOracle {
    pub fn new(config: WorldClientConfig) -> Result<Self, UpstreamError> {
        let http = config.http_client()?;
        Ok(Self { config, http })
    }

    fn transaction_url(&self, transaction_id: &str) -> Result<String, UpstreamError> {
        if !is_path_safe(transaction_id) {
            return Err(UpstreamError::Malformed("transaction id".to_string()));
        }
        Ok(format!(
            "{}/api/v2/minikit/transaction/{}",
            self.config.base(),
            transaction_id
        ))
    }
}

/// Transaction ids are embedded in a URL path; only allow a conservative alphabet.
fn is_path_safe(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 256
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[async_trait]
impl PaymentOracle for WorldPaymentOracle {
    async fn transaction_status(
        &self,
        transaction_id: &str,
    ) -> Result<TransactionStatus, UpstreamError> {
        let app_id = self.config.app_id()?;
        let url = self.transaction_url(transaction_id)?;

        let mut req = self
            .http
            .get(url)
            .query(&[("app_id", app_id), ("type", "payment")]);
        if let Some(key) = &self.config.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "payment lookup failed");
            return Err(UpstreamError::Rejected {
                code: "Payment verification failed".to_string(),
                detail: Some(format!("status {}", status.as_u16())),
            });
        }

        let tx: TransactionStatus = resp.json().await?;
        debug!(status = %tx.status, "payment lookup succeeded");
        Ok(tx)
    }
}

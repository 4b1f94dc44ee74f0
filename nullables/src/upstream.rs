//! Nullable upstream services: scripted proof verifier and payment oracle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use vouch_verification::{
    PaymentOracle, ProofPayload, ProofVerifier, TransactionStatus, UpstreamError, VerifiedSubject,
};

#[derive(Clone, Debug)]
enum Outcome {
    Accept,
    Reject { code: String, detail: Option<String> },
    Timeout,
}

/// A proof verifier whose answer is set by the test.
///
/// Accepting verifiers vouch for the payload's own nullifier hash.
pub struct NullProofVerifier {
    outcome: Mutex<Outcome>,
    calls: AtomicUsize,
}

impl NullProofVerifier {
    pub fn accepting() -> Self {
        Self::with(Outcome::Accept)
    }

    pub fn rejecting(code: &str, detail: Option<&str>) -> Self {
        Self::with(Outcome::Reject {
            code: code.to_string(),
            detail: detail.map(str::to_string),
        })
    }

    /// A verifier that never answers in time.
    pub fn timing_out() -> Self {
        Self::with(Outcome::Timeout)
    }

    fn with(outcome: Outcome) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            calls: AtomicUsize::new(0),
        }
    }

    /// Switch to accepting (or back) mid-test.
    pub fn set_accepting(&self, accept: bool) {
        *self.outcome.lock().unwrap() = if accept {
            Outcome::Accept
        } else {
            Outcome::Reject {
                code: "invalid_proof".into(),
                detail: None,
            }
        };
    }

    /// How many times `verify_proof` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProofVerifier for NullProofVerifier {
    fn name(&self) -> &str {
        "null-verifier"
    }

    async fn verify_proof(
        &self,
        payload: &ProofPayload,
        _action: &str,
    ) -> Result<VerifiedSubject, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.outcome.lock().unwrap().clone();
        match outcome {
            Outcome::Accept => Ok(VerifiedSubject {
                subject_id: payload.nullifier_hash.clone(),
            }),
            Outcome::Reject { code, detail } => Err(UpstreamError::Rejected { code, detail }),
            Outcome::Timeout => Err(UpstreamError::Timeout),
        }
    }
}

/// A payment oracle that knows only the transactions registered with it.
#[derive(Default)]
pub struct NullPaymentOracle {
    transactions: Mutex<HashMap<String, TransactionStatus>>,
}

impl NullPaymentOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transaction the oracle will report.
    pub fn insert(&self, transaction_id: &str, status: &str, reference: &str, from: &str) {
        self.transactions.lock().unwrap().insert(
            transaction_id.to_string(),
            TransactionStatus {
                status: status.to_string(),
                reference: reference.to_string(),
                from: from.to_string(),
            },
        );
    }
}

#[async_trait]
impl PaymentOracle for NullPaymentOracle {
    async fn transaction_status(
        &self,
        transaction_id: &str,
    ) -> Result<TransactionStatus, UpstreamError> {
        self.transactions
            .lock()
            .unwrap()
            .get(transaction_id)
            .cloned()
            .ok_or_else(|| UpstreamError::Rejected {
                code: "Payment verification failed".into(),
                detail: Some("unknown transaction".into()),
            })
    }
}

//! Payment-status oracle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::UpstreamError;

/// Status string of a settled transaction.
pub const MINED: &str = "mined";

/// The oracle's view of one transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatus {
    #[serde(rename = "transaction_status")]
    pub status: String,
    /// Reference the client attached when initiating the payment.
    pub reference: String,
    /// Sending wallet.
    pub from: String,
}

impl TransactionStatus {
    pub fn is_mined(&self) -> bool {
        self.status == MINED
    }
}

#[async_trait]
pub trait PaymentOracle: Send + Sync {
    async fn transaction_status(
        &self,
        transaction_id: &str,
    ) -> Result<TransactionStatus, UpstreamError>;
}

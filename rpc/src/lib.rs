//! HTTP API for the Vouch review platform.
//!
//! Provides endpoints for:
//! - Session check, sign-out, and sign-in nonces
//! - Proof-of-personhood verification and payment confirmation
//! - Place listings and per-place reviews (redacted for anonymous viewers)
//! - Proximity-gated review submission
//! - Helpfulness votes
//! - The caller's profile
//! - Prometheus metrics

pub mod cookie;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod server;
pub mod state;

pub use error::{Envelope, RpcError};
pub use metrics::ApiMetrics;
pub use server::{router, RpcServer};
pub use state::{ApiConfig, AppState, Services};

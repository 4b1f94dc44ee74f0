//! Prometheus metrics for the HTTP API.
//!
//! [`ApiMetrics`] owns a dedicated [`Registry`] that the `/metrics` endpoint
//! encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::RpcError;

pub struct ApiMetrics {
    pub registry: Registry,

    // ── Counters, labelled by outcome ───────────────────────────────────
    /// Proof-of-personhood verifications.
    pub verifications: IntCounterVec,
    /// Payment confirmations.
    pub payments: IntCounterVec,
    /// Review submissions.
    pub reviews: IntCounterVec,
    /// Helpfulness votes.
    pub votes: IntCounterVec,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Device-to-place distance of submissions rejected as too far.
    pub rejected_review_distance_m: Histogram,
}

/// Outcome label for successful requests.
pub const ACCEPTED: &str = "accepted";

impl ApiMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let verifications = register_int_counter_vec_with_registry!(
            Opts::new("vouch_verifications_total", "Identity verifications by outcome"),
            &["outcome"],
            registry
        )
        .expect("failed to register verifications counter");

        let payments = register_int_counter_vec_with_registry!(
            Opts::new("vouch_payments_total", "Payment confirmations by outcome"),
            &["outcome"],
            registry
        )
        .expect("failed to register payments counter");

        let reviews = register_int_counter_vec_with_registry!(
            Opts::new("vouch_reviews_total", "Review submissions by outcome"),
            &["outcome"],
            registry
        )
        .expect("failed to register reviews counter");

        let votes = register_int_counter_vec_with_registry!(
            Opts::new("vouch_votes_total", "Helpfulness votes by outcome"),
            &["outcome"],
            registry
        )
        .expect("failed to register votes counter");

        // 50 m → ~100 km
        let rejected_review_distance_m = register_histogram_with_registry!(
            HistogramOpts::new(
                "vouch_rejected_review_distance_meters",
                "Distance of review submissions rejected by the proximity gate"
            )
            .buckets(prometheus::exponential_buckets(50.0, 2.0, 12).unwrap()),
            registry
        )
        .expect("failed to register rejected_review_distance_m histogram");

        Self {
            registry,
            verifications,
            payments,
            reviews,
            votes,
            rejected_review_distance_m,
        }
    }

    /// Count one request against `counter` under `outcome`.
    pub fn record(counter: &IntCounterVec, outcome: &str) {
        counter.with_label_values(&[outcome]).inc();
    }

    pub fn encode(&self) -> Result<String, RpcError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|e| RpcError::Server(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| RpcError::Server(e.to_string()))
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        let metrics = ApiMetrics::new();
        ApiMetrics::record(&metrics.votes, ACCEPTED);
        ApiMetrics::record(&metrics.votes, "rate_limited");
        metrics.rejected_review_distance_m.observe(120.0);
        let text = metrics.encode().unwrap();
        assert!(text.contains("vouch_votes_total{outcome=\"accepted\"} 1"));
        assert!(text.contains("vouch_votes_total{outcome=\"rate_limited\"} 1"));
        assert!(text.contains("vouch_rejected_review_distance_meters_count 1"));
    }
}

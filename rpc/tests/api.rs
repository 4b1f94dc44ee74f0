//! End-to-end tests of the HTTP API against in-memory collaborators.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use vouch_limiter::FixedWindowLimiter;
use vouch_nullables::{NullClock, NullPaymentOracle, NullProofVerifier, NullStore};
use vouch_rpc::{router, ApiConfig, AppState, Services};
use vouch_store::PlaceRecord;
use vouch_store::PlaceStore;
use vouch_types::{Category, PlaceId};

const PLACE_LAT: f64 = 37.5665;
const PLACE_LNG: f64 = 126.9780;
const M_PER_DEG: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

struct Harness {
    app: Router,
    verifier: Arc<NullProofVerifier>,
    oracle: Arc<NullPaymentOracle>,
    place: PlaceId,
}

struct Reply {
    status: StatusCode,
    set_cookies: Vec<String>,
    body: Value,
    raw: String,
}

impl Reply {
    /// The `name=value` pair of the first `Set-Cookie` for `name`.
    fn cookie(&self, name: &str) -> Option<String> {
        self.set_cookies
            .iter()
            .find(|c| c.starts_with(&format!("{name}=")))
            .and_then(|c| c.split(';').next())
            .map(str::to_string)
    }
}

fn harness_with(verifier: NullProofVerifier, config: ApiConfig) -> Harness {
    let store = Arc::new(NullStore::new());
    let place = PlaceId::new([7; 16]);
    store
        .put_place(&PlaceRecord {
            id: place,
            name: "Cafe Onion".into(),
            name_local: None,
            latitude: PLACE_LAT,
            longitude: PLACE_LNG,
            category: Category::Cafe,
            external_map_id: None,
            address: None,
        })
        .unwrap();

    let clock = NullClock::new(1_700_000_000);
    let verifier = Arc::new(verifier);
    let oracle = Arc::new(NullPaymentOracle::new());
    let services = Services {
        limiter: Arc::new(FixedWindowLimiter::new(clock.clone())),
        verifier: verifier.clone(),
        payments: oracle.clone(),
        clock: Arc::new(clock),
    };
    let state = AppState::new(store, services, config).unwrap();
    Harness {
        app: router(Arc::new(state)),
        verifier,
        oracle,
        place,
    }
}

fn harness() -> Harness {
    harness_with(
        NullProofVerifier::accepting(),
        ApiConfig {
            session_secret: Some("integration-secret".into()),
            ..ApiConfig::default()
        },
    )
}

impl Harness {
    async fn send(&self, method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let raw = String::from_utf8(bytes.to_vec()).unwrap();
        let body = serde_json::from_str(&raw).unwrap_or(Value::Null);
        Reply {
            status,
            set_cookies,
            body,
            raw,
        }
    }

    /// Verify `nullifier` and return its `auth=...` cookie pair.
    async fn sign_in(&self, nullifier: &str) -> String {
        let reply = self
            .send(
                "POST",
                "/api/auth/verify",
                None,
                Some(json!({
                    "payload": {
                        "nullifier_hash": nullifier,
                        "merkle_root": "0xroot",
                        "proof": "0xproof",
                    },
                    "action": "verify-human",
                })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.raw);
        reply.cookie("auth").expect("auth cookie")
    }

    async fn post_review(&self, cookie: &str, meters_north: f64) -> Reply {
        self.send(
            "POST",
            "/api/reviews",
            Some(cookie),
            Some(json!({
                "place_id": self.place.to_hex(),
                "content": "Card accepted, English menu on request",
                "rating": 5,
                "tags": ["card_ok", "english_menu"],
                "user_lat": PLACE_LAT + meters_north / M_PER_DEG,
                "user_lng": PLACE_LNG,
            })),
        )
        .await
    }
}

#[tokio::test]
async fn test_verify_sets_cookie_and_check_reports_user() {
    let h = harness();
    let reply = h
        .send(
            "POST",
            "/api/auth/verify",
            None,
            Some(json!({
                "payload": {"nullifier_hash": "0xalice", "merkle_root": "0xr", "proof": "0xp"},
                "action": "verify-human",
            })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["verified"], true);
    assert_eq!(reply.body["user"]["nullifier_hash"], "0xalice");
    assert_eq!(reply.body["user"]["trust_score"], 50);
    let set = reply
        .set_cookies
        .iter()
        .find(|c| c.starts_with("auth="))
        .unwrap();
    assert!(set.contains("HttpOnly"));
    assert!(set.contains("SameSite=Lax"));
    assert!(set.contains("Max-Age=604800"));

    let cookie = reply.cookie("auth").unwrap();
    let check = h.send("GET", "/api/auth/check", Some(&cookie), None).await;
    assert_eq!(check.status, StatusCode::OK);
    assert_eq!(check.body["authenticated"], true);
    assert_eq!(check.body["access_tier"], "orb");
    assert_eq!(check.body["user"]["nullifier_hash"], "0xalice");
}

#[tokio::test]
async fn check_without_cookie_is_anonymous() {
    let h = harness();
    let reply = h.send("GET", "/api/auth/check", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "authenticated": false }));
    assert!(reply.set_cookies.is_empty());
}

#[tokio::test]
async fn forged_cookie_is_expired() {
    let h = harness();
    h.sign_in("0xalice").await;
    let reply = h
        .send("GET", "/api/auth/check", Some("auth=0xalice.deadbeef"), None)
        .await;
    assert_eq!(reply.body["authenticated"], false);
    let expired = reply.set_cookies.iter().find(|c| c.starts_with("auth=")).unwrap();
    assert!(expired.contains("Max-Age=0"));
}

#[tokio::test]
async fn rejected_proof_reports_code_and_detail() {
    let h = harness_with(
        NullProofVerifier::rejecting("max_verifications_reached", Some("already verified")),
        ApiConfig::default(),
    );
    let reply = h
        .send(
            "POST",
            "/api/auth/verify",
            None,
            Some(json!({
                "payload": {"nullifier_hash": "0xbob", "merkle_root": "0xr", "proof": "0xp"},
                "action": "verify-human",
            })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["verified"], false);
    assert_eq!(reply.body["error"], "max_verifications_reached");
    assert_eq!(reply.body["detail"], "already verified");
    assert!(reply.cookie("auth").is_none());

    // A failed attempt leaves nothing behind; the retry starts from scratch.
    h.verifier.set_accepting(true);
    let cookie = h.sign_in("0xbob").await;
    let check = h.send("GET", "/api/auth/check", Some(&cookie), None).await;
    assert_eq!(check.body["user"]["trust_score"], 50);
    assert_eq!(h.verifier.calls(), 2);
}

#[tokio::test]
async fn verifier_timeout_is_an_upstream_failure() {
    let h = harness_with(NullProofVerifier::timing_out(), ApiConfig::default());
    let reply = h
        .send(
            "POST",
            "/api/auth/verify",
            None,
            Some(json!({
                "payload": {"nullifier_hash": "0xcarol", "merkle_root": "0xr", "proof": "0xp"},
                "action": "verify-human",
            })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["verified"], false);
    assert_eq!(reply.body["error"], "upstream request timed out");
}

#[tokio::test]
async fn verify_requires_payload_and_action() {
    let h = harness();
    let reply = h
        .send("POST", "/api/auth/verify", None, Some(json!({ "action": "x" })))
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "Missing required fields");
    assert_eq!(h.verifier.calls(), 0);
}

#[tokio::test]
async fn payment_checks_reference_and_status() {
    let h = harness();
    h.oracle.insert("tx-pending", "pending", "ref-1", "0xabc123");
    h.oracle.insert("tx-mined", "mined", "ref-2", "0xabc123");

    let missing = h.send("POST", "/api/auth/payment", None, Some(json!({}))).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "Missing transaction_id or reference");

    let mismatch = h
        .send(
            "POST",
            "/api/auth/payment",
            None,
            Some(json!({"transaction_id": "tx-mined", "reference": "ref-1"})),
        )
        .await;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);
    assert_eq!(mismatch.body["error"], "Transaction reference mismatch");

    let pending = h
        .send(
            "POST",
            "/api/auth/payment",
            None,
            Some(json!({"transaction_id": "tx-pending", "reference": "ref-1"})),
        )
        .await;
    assert_eq!(pending.status, StatusCode::BAD_REQUEST);
    assert_eq!(pending.body["error"], "Transaction not completed (status: pending)");

    let ok = h
        .send(
            "POST",
            "/api/auth/payment",
            None,
            Some(json!({"transaction_id": "tx-mined", "reference": "ref-2"})),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body, json!({"success": true, "access_tier": "paid"}));
    let set = ok.set_cookies.iter().find(|c| c.starts_with("auth=")).unwrap();
    assert!(set.contains("Max-Age=2592000"));

    let cookie = ok.cookie("auth").unwrap();
    let check = h.send("GET", "/api/auth/check", Some(&cookie), None).await;
    assert_eq!(check.body["access_tier"], "paid");
    assert_eq!(check.body["user"]["nullifier_hash"], "paid_0xabc123");
}

#[tokio::test]
async fn paid_user_can_read_but_not_post() {
    let h = harness();
    h.oracle.insert("tx", "mined", "ref", "0xfeed");
    let paid = h
        .send(
            "POST",
            "/api/auth/payment",
            None,
            Some(json!({"transaction_id": "tx", "reference": "ref"})),
        )
        .await
        .cookie("auth")
        .unwrap();

    let post = h.post_review(&paid, 0.0).await;
    assert_eq!(post.status, StatusCode::FORBIDDEN);
    assert_eq!(post.body["success"], false);
    assert_eq!(post.body["error"], "Only Orb-verified users can post reviews");

    let places = h.send("GET", "/api/places", Some(&paid), None).await;
    assert_eq!(places.status, StatusCode::OK);
}

#[tokio::test]
async fn places_require_a_session_by_default() {
    let h = harness();
    let anon = h.send("GET", "/api/places", None, None).await;
    assert_eq!(anon.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anon.body["error"], "Authentication required");

    let cookie = h.sign_in("0xalice").await;
    let listed = h.send("GET", "/api/places", Some(&cookie), None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
    assert_eq!(listed.body[0]["name"], "Cafe Onion");
}

#[tokio::test]
async fn anonymous_listing_is_redacted() {
    let h = harness();
    let alice = h.sign_in("0xalice").await;
    assert_eq!(h.post_review(&alice, 10.0).await.status, StatusCode::OK);

    let uri = format!("/api/places/{}/reviews", h.place.to_hex());
    let anon = h.send("GET", &uri, None, None).await;
    assert_eq!(anon.status, StatusCode::OK);
    assert_eq!(anon.body["isAuthenticated"], false);
    assert_eq!(anon.body["reviews"][0]["content"], "");
    assert_eq!(anon.body["reviews"][0]["redacted"], true);

    let own = h.send("GET", &uri, Some(&alice), None).await;
    assert_eq!(own.body["isAuthenticated"], true);
    assert_eq!(
        own.body["reviews"][0]["content"],
        "Card accepted, English menu on request"
    );
    assert_eq!(own.body["reviews"][0]["isOwnReview"], true);
}

#[tokio::test]
async fn listing_never_exposes_author_identity_keys() {
    let h = harness_with(NullProofVerifier::accepting(), ApiConfig::default());
    let alice = h.sign_in("0xalice").await;
    let bob = h.sign_in("0xbob").await;
    assert_eq!(h.post_review(&alice, 5.0).await.status, StatusCode::OK);
    assert_eq!(h.post_review(&bob, 15.0).await.status, StatusCode::OK);

    let uri = format!("/api/places/{}/reviews", h.place.to_hex());
    for cookie in [None, Some(alice.as_str())] {
        let listed = h.send("GET", &uri, cookie, None).await;
        assert_eq!(listed.status, StatusCode::OK);
        let reviews = listed.body["reviews"].as_array().unwrap();
        assert_eq!(reviews.len(), 2);
        assert!(reviews.iter().all(|r| r.get("author").is_none()));
        assert!(!listed.raw.contains("0xalice"), "{}", listed.raw);
        assert!(!listed.raw.contains("0xbob"), "{}", listed.raw);
    }
}

#[tokio::test]
async fn unknown_place_is_not_found() {
    let h = harness();
    let reply = h.send("GET", "/api/places/not-a-place/reviews", None, None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"], "Place not found");
}

#[tokio::test]
async fn review_beyond_radius_is_forbidden_with_distance() {
    let h = harness();
    let alice = h.sign_in("0xalice").await;

    let far = h.post_review(&alice, 51.0).await;
    assert_eq!(far.status, StatusCode::FORBIDDEN);
    assert_eq!(far.body["success"], false);
    assert_eq!(far.body["distance"], 51);
    assert_eq!(
        far.body["error"],
        "You must be within 50m of this location to post a review"
    );

    let near = h.post_review(&alice, 50.0).await;
    assert_eq!(near.status, StatusCode::OK, "{}", near.raw);
    assert_eq!(near.body["success"], true);
    assert_eq!(near.body["review"]["rating"], 5);
}

#[tokio::test]
async fn review_without_session_is_unauthorized() {
    let h = harness();
    let reply = h
        .send("POST", "/api/reviews", None, Some(json!({"content": "hi"})))
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["success"], false);
}

#[tokio::test]
async fn votes_update_counts_and_author_trust() {
    let h = harness();
    let alice = h.sign_in("0xalice").await;
    let bob = h.sign_in("0xbob").await;
    let review = h.post_review(&alice, 0.0).await.body["review"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/api/reviews/{review}/vote");

    let up = h
        .send("POST", &uri, Some(&bob), Some(json!({"is_helpful": true})))
        .await;
    assert_eq!(up.status, StatusCode::OK);
    assert_eq!(up.body["review"]["helpful_count"], 1);
    assert_eq!(up.body["vote"]["is_helpful"], true);

    let flipped = h
        .send("POST", &uri, Some(&bob), Some(json!({"is_helpful": false})))
        .await;
    assert_eq!(flipped.body["review"]["helpful_count"], 0);
    assert_eq!(flipped.body["review"]["not_helpful_count"], 1);

    let profile = h.send("GET", "/api/user/profile", Some(&alice), None).await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["user"]["trust_score"], 47);
    assert_eq!(profile.body["stats"]["review_count"], 1);
    assert_eq!(profile.body["reviews"][0]["place_name"], "Cafe Onion");
}

#[tokio::test]
async fn vote_rejections_map_to_statuses() {
    let h = harness();
    let alice = h.sign_in("0xalice").await;
    let review = h.post_review(&alice, 0.0).await.body["review"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/api/reviews/{review}/vote");

    let own = h
        .send("POST", &uri, Some(&alice), Some(json!({"is_helpful": true})))
        .await;
    assert_eq!(own.status, StatusCode::FORBIDDEN);
    assert_eq!(own.body["error"], "You cannot vote on your own review");

    let bob = h.sign_in("0xbob").await;
    let bad_body = h
        .send("POST", &uri, Some(&bob), Some(json!({"is_helpful": "yes"})))
        .await;
    assert_eq!(bad_body.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_body.body["error"], "is_helpful must be a boolean");

    let missing = h
        .send(
            "POST",
            &format!("/api/reviews/{}/vote", "ab".repeat(16)),
            Some(&bob),
            Some(json!({"is_helpful": true})),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"], "Review not found");

    let anon = h
        .send("POST", &uri, None, Some(json!({"is_helpful": true})))
        .await;
    assert_eq!(anon.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn fifty_first_vote_is_rate_limited() {
    let h = harness();
    let alice = h.sign_in("0xalice").await;
    let bob = h.sign_in("0xbob").await;
    let review = h.post_review(&alice, 0.0).await.body["review"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let uri = format!("/api/reviews/{review}/vote");

    for i in 0..50 {
        let reply = h
            .send("POST", &uri, Some(&bob), Some(json!({"is_helpful": i % 2 == 0})))
            .await;
        assert_eq!(reply.status, StatusCode::OK, "vote {i}");
    }
    let limited = h
        .send("POST", &uri, Some(&bob), Some(json!({"is_helpful": true})))
        .await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["error"], "Rate limit exceeded. Try again tomorrow.");
}

#[tokio::test]
async fn profile_requires_session() {
    let h = harness();
    let reply = h.send("GET", "/api/user/profile", None, None).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn nonce_and_payment_reference_are_random_hex() {
    let h = harness();
    let nonce = h.send("GET", "/api/auth/nonce", None, None).await;
    let value = nonce.body["nonce"].as_str().unwrap().to_string();
    assert_eq!(value.len(), 32);
    assert!(value.chars().all(|c| c.is_ascii_hexdigit()));
    let set = nonce
        .set_cookies
        .iter()
        .find(|c| c.starts_with("siwe-nonce="))
        .unwrap();
    assert!(set.contains("SameSite=Strict"));
    assert!(set.contains("Max-Age=300"));

    let a = h.send("POST", "/api/auth/initiate-payment", None, None).await;
    let b = h.send("POST", "/api/auth/initiate-payment", None, None).await;
    assert_eq!(a.body["id"].as_str().unwrap().len(), 32);
    assert_ne!(a.body["id"], b.body["id"]);
}

#[tokio::test]
async fn signout_expires_the_cookie() {
    let h = harness();
    let reply = h.send("POST", "/api/auth/signout", None, None).await;
    assert_eq!(reply.body, json!({"success": true}));
    let set = reply.set_cookies.iter().find(|c| c.starts_with("auth=")).unwrap();
    assert!(set.contains("Max-Age=0"));
}

#[tokio::test]
async fn metrics_count_outcomes() {
    let h = harness();
    let alice = h.sign_in("0xalice").await;
    h.post_review(&alice, 500.0).await;

    let reply = h.send("GET", "/metrics", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply
        .raw
        .contains("vouch_verifications_total{outcome=\"accepted\"} 1"));
    assert!(reply.raw.contains("vouch_reviews_total{outcome=\"too_far\"} 1"));
    assert!(reply.raw.contains("vouch_rejected_review_distance_meters_count 1"));
}

#[tokio::test]
async fn metrics_route_can_be_disabled() {
    let h = harness_with(
        NullProofVerifier::accepting(),
        ApiConfig {
            enable_metrics: false,
            ..ApiConfig::default()
        },
    );
    let reply = h.send("GET", "/metrics", None, None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;
use vouch_store::VouchStore;

use crate::error::RpcError;
use crate::handlers::{auth, places, profile, reviews};
use crate::state::AppState;

/// Build the router for every API endpoint.
pub fn router<S: VouchStore + 'static>(state: Arc<AppState<S>>) -> Router {
    let mut app = Router::new()
        .route("/api/auth/check", get(auth::check::<S>))
        .route("/api/auth/verify", post(auth::verify::<S>))
        .route("/api/auth/payment", post(auth::payment::<S>))
        .route("/api/auth/initiate-payment", post(auth::initiate_payment))
        .route("/api/auth/nonce", get(auth::nonce::<S>))
        .route("/api/auth/signout", post(auth::signout::<S>))
        .route("/api/places", get(places::list_places::<S>))
        .route("/api/places/:id/reviews", get(places::place_reviews::<S>))
        .route("/api/reviews", post(reviews::create_review::<S>))
        .route("/api/reviews/:id/vote", post(reviews::vote::<S>))
        .route("/api/user/profile", get(profile::profile::<S>));
    if state.config.enable_metrics {
        app = app.route("/metrics", get(metrics_endpoint::<S>));
    }
    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// GET /metrics
async fn metrics_endpoint<S: VouchStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Response {
    match state.metrics.encode() {
        Ok(text) => (
            [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            text,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub struct RpcServer<S> {
    pub addr: SocketAddr,
    pub state: Arc<AppState<S>>,
}

impl<S: VouchStore + 'static> RpcServer<S> {
    pub fn new(addr: SocketAddr, state: Arc<AppState<S>>) -> Self {
        Self { addr, state }
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {}: {e}", self.addr)))?;
        info!(addr = %self.addr, "HTTP API listening");
        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}

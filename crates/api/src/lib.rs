//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for accounts and transfers
//! - Error-to-response mapping
//! - Request tracing with request ids

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info_span;
use transfer_core::ledger::{AccountLedger, TransactionalStore};

pub use error::ApiError;

/// Application state shared across handlers.
pub struct AppState<S> {
    /// The account ledger.
    pub ledger: Arc<AccountLedger<S>>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
        }
    }
}

/// Creates the main application router.
pub fn create_router<S: TransactionalStore>(ledger: Arc<AccountLedger<S>>) -> Router {
    let state = AppState { ledger };

    Router::new()
        .merge(routes::api_routes())
        .fallback(routes::fallback)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        let request_id = request
                            .headers()
                            .get("x-request-id")
                            .and_then(|value| value.to_str().ok())
                            .unwrap_or("-");
                        info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id,
                        )
                    }),
                )
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

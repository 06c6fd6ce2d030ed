//! # Routes
//!
//! Axum router configuration for the payment API.

use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Create the main application router
///
/// Routes:
/// - GET  /transactions/payment/pay/{provider}/{transaction_id}
///        302 to the provider-hosted checkout
/// - GET  /transactions/payment/callback/{provider}
///        browser redirect-back reconciliation
/// - POST /transactions/payment/callback/{provider}
///        provider server-to-server event (signed body)
/// - GET  /health
///
/// The payment routes carry no session/auth middleware: the payer's
/// browser and the provider's servers hold no session. Callbacks are
/// authenticated by their signature instead.
pub fn create_router(state: AppState) -> Router {
    let payment_routes = Router::new()
        .route(
            "/pay/{provider}/{transaction_id}",
            get(handlers::pay_redirect),
        )
        .route(
            "/callback/{provider}",
            get(handlers::payment_callback).post(handlers::payment_callback),
        );

    Router::new()
        // Health check at root
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        // Payment flow
        .nest("/transactions/payment", payment_routes)
        // Middleware
        .layer(TraceLayer::new_for_http())
        // State
        .with_state(state)
}

//! # Payflow RS
//!
//! Payment gateway service: hosted-checkout initiation and asynchronous
//! callback reconciliation.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export WOMPI_PUBLIC_KEY=pub_test_...
//! export WOMPI_PRIVATE_KEY=prv_test_...
//! export WOMPI_INTEGRITY_SECRET=...
//! export WOMPI_EVENTS_SECRET=...
//!
//! # Run the server
//! payflow
//! ```

use payflow_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Initialize application state
    let state = AppState::new().await?;

    let addr = state.config.socket_addr();
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Payment providers: {:?}", state.flow.registry().providers());

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("Payflow starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!(
            "Pay: GET http://{}/transactions/payment/pay/wompi/{{transaction_id}}",
            addr
        );
        info!(
            "Callback: http://{}/transactions/payment/callback/wompi",
            addr
        );
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

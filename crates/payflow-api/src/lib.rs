//! # payflow-api
//!
//! HTTP API layer for payflow-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - Payment initiation redirect and provider callback endpoints
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/transactions/payment/pay/{provider}/{transaction_id}` | 302 to hosted checkout |
//! | GET/POST | `/transactions/payment/callback/{provider}` | Reconcile provider callback |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};

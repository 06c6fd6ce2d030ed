//! # payflow-wompi
//!
//! Wompi hosted-checkout gateway adapter for payflow-rs.
//!
//! Wompi is a Colombian hosted-checkout provider: the payer is redirected
//! to Wompi's checkout page with a signed query string, pays there, and
//! Wompi reports the outcome twice — by redirecting the payer's browser
//! back (with the Wompi transaction id) and by POSTing a signed event to
//! the callback endpoint.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use payflow_wompi::WompiGateway;
//! use payflow_core::{PaymentGateway, RedirectContext};
//!
//! // Create gateway from environment
//! let gateway = WompiGateway::from_env()?;
//!
//! // Build the hosted-checkout redirect
//! let redirect = gateway.create_redirect(&snapshot, &ctx).await?;
//!
//! // Redirect the payer to redirect.url
//! ```
//!
//! ## Callback Handling
//!
//! `check_event` accepts both callback shapes:
//! - browser redirect with `?id=<wompi transaction id>` — the transaction
//!   status is pulled from the Wompi API rather than trusting the redirect
//! - signed event body — the checksum is verified before any field is
//!   used, and when it does not cover the reference the outcome is pulled
//!   from the Wompi API by the signed transaction id

pub mod checkout;
pub mod config;
pub mod events;
mod signature;

// Re-exports
pub use checkout::WompiGateway;
pub use config::WompiConfig;
pub use events::{compute_checksum, verify_event, EventOutcome};

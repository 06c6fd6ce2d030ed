//! # payflow-core
//!
//! Core types and traits for the payflow payment gateway.
//!
//! This crate provides:
//! - `Amount` and `Currency` monetary value types
//! - `Transaction` and its status state machine
//! - `PaymentGateway` trait for implementing payment providers
//! - `GatewayRegistry` for provider lookup
//! - `TransactionStore` boundary trait (plus an in-memory implementation)
//! - `PaymentFlow`, the transaction lifecycle controller
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use payflow_core::{GatewayRegistry, MemoryTransactionStore, PaymentFlow, RedirectContext};
//!
//! let registry = GatewayRegistry::new().with_gateway(wompi);
//! let flow = PaymentFlow::new(registry, store);
//!
//! // Initiate: marks the transaction pending and builds the redirect
//! let redirect = flow.pay("wompi", transaction_id, &ctx).await?;
//!
//! // Later, reconcile the provider's confirmation
//! let ack = flow.callback("wompi", &callback_request).await?;
//! ```

pub mod error;
pub mod flow;
pub mod gateway;
pub mod money;
pub mod store;
pub mod transaction;

// Re-exports for convenience
pub use error::{PaymentError, PaymentResult, StoreError};
pub use flow::{CallbackAck, PaymentFlow};
pub use gateway::{
    BoxedGateway, CallbackRequest, GatewayRegistry, PaymentGateway, RedirectContext,
};
pub use money::{Amount, Currency};
pub use store::{CasOutcome, MemoryTransactionStore, StatusUpdate, TransactionStore};
pub use transaction::{
    CallbackDecision, CheckoutRedirect, EventStatus, PaymentEvent, Transaction, TransactionId,
    TransactionSnapshot, TransactionStatus,
};

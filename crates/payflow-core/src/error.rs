//! # Payment Error Types
//!
//! Typed error handling for the payflow payment gateway.
//! All payment operations return `Result<T, PaymentError>`.

use thiserror::Error;

/// Core error type for all payment operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data (malformed ids, negative amounts)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested provider key is not registered
    #[error("Unknown payment provider: {provider}")]
    UnknownProvider { provider: String },

    /// Referenced transaction does not exist
    #[error("Transaction not found: {reference}")]
    TransactionNotFound { reference: String },

    /// Callback payload failed to parse or failed signature verification
    #[error("Invalid callback: {0}")]
    InvalidCallback(String),

    /// A callback or pay request contradicts an already-terminal status
    #[error("Status conflict on {reference}: transaction is {current}, requested {requested}")]
    StatusConflict {
        reference: String,
        current: String,
        requested: String,
    },

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Transaction store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaymentError {
    /// Returns true if this error is retryable.
    ///
    /// Only store and provider connectivity failures qualify; parse and
    /// signature failures are terminal for the request so that providers
    /// stop retrying permanently invalid payloads.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::NetworkError(_)
                | PaymentError::ProviderError { .. }
                | PaymentError::Store(_)
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::UnknownProvider { .. } => 400,
            PaymentError::TransactionNotFound { .. } => 404,
            PaymentError::InvalidCallback(_) => 400,
            PaymentError::StatusConflict { .. } => 409,
            PaymentError::ProviderError { .. } => 502,
            PaymentError::NetworkError(_) => 503,
            PaymentError::Store(_) => 500,
            PaymentError::Serialization(_) => 500,
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;

/// Errors surfaced by the transaction store boundary.
///
/// The store is an external collaborator; these are the only failures the
/// lifecycle controller maps to 5xx and leaves to the provider's retry
/// semantics.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connectivity or backend failure
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Row addressed by a conditional update no longer exists
    #[error("no stored transaction for {0}")]
    Missing(String),
}

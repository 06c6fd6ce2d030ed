//! # Wompi Configuration
//!
//! Configuration management for the Wompi integration.
//! All secrets are loaded from environment variables.

use payflow_core::PaymentError;
use std::env;

/// Wompi API configuration
#[derive(Debug, Clone)]
pub struct WompiConfig {
    /// Public merchant key (pub_test_... or pub_prod_...)
    pub public_key: String,

    /// Private API key (prv_test_... or prv_prod_...), used for the
    /// transaction-status pull
    pub private_key: String,

    /// Integrity secret signing the checkout redirect
    pub integrity_secret: String,

    /// Events secret verifying inbound event checksums
    pub events_secret: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// Hosted checkout base URL
    pub checkout_base_url: String,
}

impl WompiConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `WOMPI_PUBLIC_KEY`
    /// - `WOMPI_PRIVATE_KEY`
    /// - `WOMPI_INTEGRITY_SECRET`
    /// - `WOMPI_EVENTS_SECRET`
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let public_key = env::var("WOMPI_PUBLIC_KEY")
            .map_err(|_| PaymentError::Configuration("WOMPI_PUBLIC_KEY not set".to_string()))?;

        let private_key = env::var("WOMPI_PRIVATE_KEY")
            .map_err(|_| PaymentError::Configuration("WOMPI_PRIVATE_KEY not set".to_string()))?;

        let integrity_secret = env::var("WOMPI_INTEGRITY_SECRET").map_err(|_| {
            PaymentError::Configuration("WOMPI_INTEGRITY_SECRET not set".to_string())
        })?;

        let events_secret = env::var("WOMPI_EVENTS_SECRET")
            .map_err(|_| PaymentError::Configuration("WOMPI_EVENTS_SECRET not set".to_string()))?;

        // Validate key formats
        if !public_key.starts_with("pub_test_") && !public_key.starts_with("pub_prod_") {
            return Err(PaymentError::Configuration(
                "WOMPI_PUBLIC_KEY must start with pub_test_ or pub_prod_".to_string(),
            ));
        }

        if !private_key.starts_with("prv_test_") && !private_key.starts_with("prv_prod_") {
            return Err(PaymentError::Configuration(
                "WOMPI_PRIVATE_KEY must start with prv_test_ or prv_prod_".to_string(),
            ));
        }

        // The redirect signature is a mandatory security control, never
        // cosmetic; refuse to start without a secret to sign with.
        if integrity_secret.is_empty() {
            return Err(PaymentError::Configuration(
                "WOMPI_INTEGRITY_SECRET must not be empty".to_string(),
            ));
        }

        if events_secret.is_empty() {
            return Err(PaymentError::Configuration(
                "WOMPI_EVENTS_SECRET must not be empty".to_string(),
            ));
        }

        let api_base_url = if public_key.starts_with("pub_test_") {
            "https://sandbox.wompi.co".to_string()
        } else {
            "https://production.wompi.co".to_string()
        };

        Ok(Self {
            public_key,
            private_key,
            integrity_secret,
            events_secret,
            api_base_url,
            checkout_base_url: "https://checkout.wompi.co/p/".to_string(),
        })
    }

    /// Create config with explicit values (for testing)
    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        integrity_secret: impl Into<String>,
        events_secret: impl Into<String>,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
            integrity_secret: integrity_secret.into(),
            events_secret: events_secret.into(),
            api_base_url: "https://sandbox.wompi.co".to_string(),
            checkout_base_url: "https://checkout.wompi.co/p/".to_string(),
        }
    }

    /// Check if using sandbox keys
    pub fn is_test_mode(&self) -> bool {
        self.public_key.starts_with("pub_test_")
    }

    /// Get authorization header value for the transactions API
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.private_key)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Builder: set custom hosted-checkout base URL
    pub fn with_checkout_base_url(mut self, url: impl Into<String>) -> Self {
        self.checkout_base_url = url.into();
        self
    }
}

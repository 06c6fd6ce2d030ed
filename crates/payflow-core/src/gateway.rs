//! # Payment Gateway Trait
//!
//! Capability contract implemented once per payment provider.
//!
//! The two operations isolate provider wire formats (query-string
//! redirects, signed JSON webhooks, status polling) so the lifecycle
//! controller never branches on provider identity beyond the registry
//! lookup:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PaymentGateway (trait)                   │
//! │  ├── create_redirect()                                      │
//! │  ├── check_event()                                          │
//! │  └── fee() / fixed_fee()                                    │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!          ┌─────────────────┼─────────────────┐
//!          │                 │                 │
//!  ┌───────┴───────┐ ┌───────┴───────┐ ┌───────┴───────┐
//!  │ WompiGateway  │ │  PayUGateway  │ │ MercadoPago   │
//!  │               │ │   (future)    │ │   (future)    │
//!  └───────────────┘ └───────────────┘ └───────────────┘
//! ```

use crate::error::{PaymentError, PaymentResult};
use crate::money::Amount;
use crate::transaction::{CheckoutRedirect, PaymentEvent, TransactionSnapshot};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

/// Ambient request context for building absolute redirect-back URLs
#[derive(Debug, Clone)]
pub struct RedirectContext {
    /// Public base URL of this service (e.g. "https://shop.example.com")
    pub base_url: String,
}

impl RedirectContext {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Callback endpoint for a provider, rooted at this service.
    ///
    /// Adapters append the transaction reference so the payer's browser
    /// round-trip and the asynchronous confirmation resolve to the same
    /// transaction.
    pub fn callback_url(&self, provider: &str) -> String {
        format!(
            "{}/transactions/payment/callback/{}",
            self.base_url.trim_end_matches('/'),
            provider
        )
    }
}

/// Raw inbound callback input, provider-specific in shape.
///
/// Browser redirects arrive as query parameters; server-to-server
/// confirmations arrive as a signed body.
#[derive(Debug, Clone, Default)]
pub struct CallbackRequest {
    pub query: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl CallbackRequest {
    pub fn from_query(query: HashMap<String, String>) -> Self {
        Self {
            query,
            body: Vec::new(),
        }
    }

    pub fn from_body(body: impl Into<Vec<u8>>) -> Self {
        Self {
            query: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}

/// Core trait for payment provider implementations
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registry key for this provider (case-sensitive, e.g. "wompi")
    fn provider_key(&self) -> &'static str;

    /// Percentage fee the provider charges (informational, for payout
    /// accounting; not enforced here)
    fn fee(&self) -> Decimal;

    /// Flat fee per transaction in major currency units (informational)
    fn fixed_fee(&self) -> Decimal;

    /// Expected payout after provider fees, in major currency units
    fn net_payout(&self, total: &Amount) -> Decimal {
        let gross = total.as_decimal();
        gross - gross * self.fee() / Decimal::ONE_HUNDRED - self.fixed_fee()
    }

    /// Build the redirect that sends the payer to the provider-hosted
    /// checkout for this transaction.
    ///
    /// Must not mutate the transaction; the controller marks it pending
    /// before this call.
    async fn create_redirect(
        &self,
        snapshot: &TransactionSnapshot,
        ctx: &RedirectContext,
    ) -> PaymentResult<CheckoutRedirect>;

    /// Interpret an inbound callback into a canonical event.
    ///
    /// Fails with `InvalidCallback` when the payload cannot be parsed or
    /// its integrity check fails.
    async fn check_event(&self, request: &CallbackRequest) -> PaymentResult<PaymentEvent>;
}

/// Type alias for a shared gateway trait object
pub type BoxedGateway = Arc<dyn PaymentGateway>;

/// Fixed provider-key -> gateway mapping.
///
/// Built once at startup and read-only afterwards, so concurrent lookups
/// need no synchronization. Lookup is case-sensitive; an unknown key is a
/// typed request error, never a panic.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<String, BoxedGateway>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self {
            gateways: HashMap::new(),
        }
    }

    /// Register a gateway under its own provider key
    pub fn register(&mut self, gateway: BoxedGateway) {
        self.gateways
            .insert(gateway.provider_key().to_string(), gateway);
    }

    /// Register with builder pattern
    pub fn with_gateway(mut self, gateway: BoxedGateway) -> Self {
        self.register(gateway);
        self
    }

    /// Look up a gateway by provider key
    pub fn get(&self, provider: &str) -> Option<&BoxedGateway> {
        self.gateways.get(provider)
    }

    /// Look up a gateway, failing with `UnknownProvider` on a miss
    pub fn resolve(&self, provider: &str) -> PaymentResult<&BoxedGateway> {
        self.get(provider).ok_or_else(|| PaymentError::UnknownProvider {
            provider: provider.to_string(),
        })
    }

    /// List all registered provider keys
    pub fn providers(&self) -> Vec<&str> {
        self.gateways.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_provider(&self, provider: &str) -> bool {
        self.gateways.contains_key(provider)
    }
}

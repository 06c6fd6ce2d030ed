//! # Wompi Hosted Checkout
//!
//! Gateway implementation for Wompi's hosted checkout: builds the signed
//! redirect that sends the payer to Wompi, and reconciles outcomes either
//! by pulling the transaction from the Wompi API (browser redirect) or by
//! verifying a signed event body (server-to-server confirmation).

use crate::config::WompiConfig;
use crate::events;
use crate::signature::hmac_sha256_hex;
use async_trait::async_trait;
use payflow_core::{
    CallbackRequest, CheckoutRedirect, PaymentError, PaymentEvent, PaymentGateway, PaymentResult,
    RedirectContext, TransactionSnapshot,
};
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};
use url::Url;

/// Wompi hosted-checkout gateway
pub struct WompiGateway {
    config: WompiConfig,
    client: Client,
}

impl WompiGateway {
    /// Create a new Wompi gateway
    pub fn new(config: WompiConfig) -> Self {
        // An unreachable provider must not hang the request
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        let config = WompiConfig::from_env()?;
        Ok(Self::new(config))
    }

    /// Integrity signature over the checkout parameters.
    ///
    /// Canonical string is `reference|amount_in_cents|currency`, keyed
    /// with the integrity secret. Mis-ordering these fields would allow
    /// amount tampering, so the order is fixed here and nowhere else.
    fn integrity_signature(&self, reference: &str, amount_in_cents: i64, currency: &str) -> String {
        let canonical = format!("{}|{}|{}", reference, amount_in_cents, currency);
        hmac_sha256_hex(&self.config.integrity_secret, &canonical)
    }

    /// Pull a transaction from the Wompi API by its provider-side id
    /// ("pull" reconciliation: unauthenticated redirects are never
    /// trusted as financial truth).
    async fn fetch_transaction(&self, provider_tx_id: &str) -> PaymentResult<PaymentEvent> {
        // The id came in on the query string of an unauthenticated
        // redirect; keep it out of the URL unless it is shaped like one.
        if provider_tx_id.is_empty()
            || !provider_tx_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(PaymentError::InvalidCallback(
                "malformed provider transaction id".to_string(),
            ));
        }

        let url = format!(
            "{}/v1/transactions/{}",
            self.config.api_base_url, provider_tx_id
        );

        debug!(provider_tx_id = provider_tx_id, "pulling transaction status");

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.config.auth_header())
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if status == reqwest::StatusCode::NOT_FOUND {
            // The id is untrusted input; an unknown one is a bad callback,
            // not a provider outage
            return Err(PaymentError::InvalidCallback(format!(
                "no such provider transaction: {}",
                provider_tx_id
            )));
        }

        if !status.is_success() {
            error!("Wompi API error: status={}, body={}", status, body);
            return Err(PaymentError::ProviderError {
                provider: "wompi".to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let envelope: WompiTransactionEnvelope = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Wompi response: {}", e))
        })?;

        info!(
            provider_tx_id = %envelope.data.id,
            reference = %envelope.data.reference,
            status = %envelope.data.status,
            "pulled transaction status"
        );

        Ok(PaymentEvent {
            reference: envelope.data.reference,
            status: events::map_status(&envelope.data.status)?,
        })
    }
}

#[async_trait]
impl PaymentGateway for WompiGateway {
    fn provider_key(&self) -> &'static str {
        "wompi"
    }

    /// Wompi's card/PSE percentage fee
    fn fee(&self) -> Decimal {
        dec!(2.65)
    }

    /// Flat fee per approved transaction, in COP
    fn fixed_fee(&self) -> Decimal {
        dec!(700)
    }

    #[instrument(skip(self, snapshot, ctx), fields(reference = %snapshot.id))]
    async fn create_redirect(
        &self,
        snapshot: &TransactionSnapshot,
        ctx: &RedirectContext,
    ) -> PaymentResult<CheckoutRedirect> {
        let reference = snapshot.id.to_string();
        let amount_in_cents = snapshot.total.minor();
        let currency = snapshot.total.currency().as_str();
        let signature = self.integrity_signature(&reference, amount_in_cents, currency);

        // The redirect-back URL carries the reference so the payer's
        // browser round-trip resolves to the same transaction as the
        // asynchronous event.
        let redirect_url = format!(
            "{}?reference={}",
            ctx.callback_url(self.provider_key()),
            reference
        );

        let mut url = Url::parse(&self.config.checkout_base_url)
            .map_err(|e| PaymentError::Configuration(format!("bad checkout base URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("public-key", &self.config.public_key)
            .append_pair("currency", currency)
            .append_pair("amount-in-cents", &amount_in_cents.to_string())
            .append_pair("reference", &reference)
            .append_pair("redirect-url", &redirect_url)
            .append_pair("signature:integrity", &signature);

        debug!(amount_in_cents = amount_in_cents, currency = currency, "built checkout redirect");

        Ok(CheckoutRedirect {
            provider: self.provider_key().to_string(),
            url: url.into(),
        })
    }

    #[instrument(skip(self, request))]
    async fn check_event(&self, request: &CallbackRequest) -> PaymentResult<PaymentEvent> {
        // Server-to-server confirmations carry a signed body; browser
        // redirects carry the Wompi transaction id on the query string.
        if request.has_body() {
            return match events::verify_event(&self.config.events_secret, &request.body)? {
                events::EventOutcome::Trusted(event) => Ok(event),
                // The event's own signature does not cover the reference;
                // resolve the outcome through the API by the signed id
                events::EventOutcome::RequiresPull { provider_tx_id } => {
                    self.fetch_transaction(&provider_tx_id).await
                }
            };
        }

        let provider_tx_id = request.query.get("id").ok_or_else(|| {
            PaymentError::InvalidCallback("missing provider transaction id".to_string())
        })?;

        self.fetch_transaction(provider_tx_id).await
    }
}

// =============================================================================
// Wompi API Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct WompiTransactionEnvelope {
    data: WompiTransaction,
}

#[derive(Debug, Deserialize)]
struct WompiTransaction {
    id: String,
    reference: String,
    status: String,
    #[serde(default)]
    #[allow(dead_code)]
    amount_in_cents: Option<i64>,
    #[serde(default)]
    #[allow(dead_code)]
    currency: Option<String>,
}

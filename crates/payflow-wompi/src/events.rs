//! # Wompi Event Payloads
//!
//! Parsing and verification of Wompi's server-to-server transaction
//! events. The checksum is verified before any field of the payload is
//! trusted, and fields outside the signed property set are never trusted
//! at all: when the event's own signature does not cover the reference
//! and status, verification yields the signed provider transaction id so
//! the caller can pull the authoritative outcome from the API instead.
//! An unverifiable payload is a 4xx-class `InvalidCallback`, never a
//! 5xx, so the provider stops retrying permanently bad input.

use crate::signature::{constant_time_eq, hmac_sha256_hex};
use payflow_core::{EventStatus, PaymentError, PaymentEvent, PaymentResult};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Raw event envelope as posted by Wompi
#[derive(Debug, Deserialize)]
struct WompiEvent {
    event: String,
    data: Value,
    signature: WompiEventSignature,
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct WompiEventSignature {
    checksum: String,
    properties: Vec<String>,
}

/// Outcome of verifying a signed event body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Every field the event consumes was covered by the checksum
    Trusted(PaymentEvent),
    /// Checksum valid, but the reference or status sits outside the
    /// signed property set; only the signed provider transaction id is
    /// trustworthy, and the outcome must be pulled from the API
    RequiresPull { provider_tx_id: String },
}

/// Verify an inbound event body.
///
/// The checksum only authenticates the properties the event declares as
/// signed. A field outside that set is attacker-writable even on a body
/// with a valid checksum, so the reference and status are consumed
/// directly only when both are signed; otherwise the signed provider
/// transaction id is returned for pull reconciliation.
pub fn verify_event(events_secret: &str, body: &[u8]) -> PaymentResult<EventOutcome> {
    let event: WompiEvent = serde_json::from_slice(body)
        .map_err(|e| PaymentError::InvalidCallback(format!("malformed event payload: {}", e)))?;

    if event.event != "transaction.updated" {
        debug!(event_type = %event.event, "ignoring non-transaction event");
        return Err(PaymentError::InvalidCallback(format!(
            "unhandled event type {:?}",
            event.event
        )));
    }

    let properties: Vec<&str> = event.signature.properties.iter().map(|p| p.as_str()).collect();
    let expected = compute_checksum(events_secret, &event.data, &properties, event.timestamp)?;

    if !constant_time_eq(&event.signature.checksum.to_lowercase(), &expected) {
        return Err(PaymentError::InvalidCallback(
            "event checksum mismatch".to_string(),
        ));
    }

    // Checksum verified; only the properties it covers are trustworthy
    let transaction = event
        .data
        .get("transaction")
        .ok_or_else(|| PaymentError::InvalidCallback("event missing transaction".to_string()))?;
    let signed = |field: &str| properties.iter().any(|p| *p == field);

    if signed("transaction.reference") && signed("transaction.status") {
        let reference = transaction
            .get("reference")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PaymentError::InvalidCallback("event missing reference".to_string()))?;

        let status = transaction
            .get("status")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PaymentError::InvalidCallback("event missing status".to_string()))?;

        return Ok(EventOutcome::Trusted(PaymentEvent {
            reference: reference.to_string(),
            status: map_status(status)?,
        }));
    }

    if signed("transaction.id") {
        let provider_tx_id = transaction
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PaymentError::InvalidCallback("event missing id".to_string()))?;
        debug!(
            provider_tx_id = provider_tx_id,
            "event reference not signed, deferring to API pull"
        );
        return Ok(EventOutcome::RequiresPull {
            provider_tx_id: provider_tx_id.to_string(),
        });
    }

    Err(PaymentError::InvalidCallback(
        "checksum covers neither the reference nor the provider transaction id".to_string(),
    ))
}

/// Compute the keyed checksum over the signed properties of an event.
///
/// Canonical string: the values named by `properties` (dotted paths into
/// `data`), concatenated in order, followed by the event timestamp; keyed
/// with the events secret.
pub fn compute_checksum(
    events_secret: &str,
    data: &Value,
    properties: &[&str],
    timestamp: i64,
) -> PaymentResult<String> {
    if properties.is_empty() {
        return Err(PaymentError::InvalidCallback(
            "event signs no properties".to_string(),
        ));
    }

    let mut canonical = String::new();
    for property in properties {
        let mut node = data;
        for segment in property.split('.') {
            node = node.get(segment).ok_or_else(|| {
                PaymentError::InvalidCallback(format!("signed property {:?} missing", property))
            })?;
        }
        match node {
            Value::String(v) => canonical.push_str(v),
            Value::Number(n) => canonical.push_str(&n.to_string()),
            _ => {
                return Err(PaymentError::InvalidCallback(format!(
                    "signed property {:?} is not a scalar",
                    property
                )))
            }
        }
    }
    canonical.push_str(&timestamp.to_string());

    Ok(hmac_sha256_hex(events_secret, &canonical))
}

/// Map a Wompi transaction status onto the canonical event status
pub(crate) fn map_status(status: &str) -> PaymentResult<EventStatus> {
    match status {
        "APPROVED" => Ok(EventStatus::Approved),
        "PENDING" => Ok(EventStatus::InProgress),
        "DECLINED" | "VOIDED" | "ERROR" => Ok(EventStatus::Declined),
        other => Err(PaymentError::InvalidCallback(format!(
            "unrecognized transaction status {:?}",
            other
        ))),
    }
}

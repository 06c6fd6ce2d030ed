//! # Transaction Types
//!
//! The durable transaction record, its status state machine, and the
//! canonical payment event adapters translate provider callbacks into.

use crate::money::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique transaction id, used verbatim as the provider-facing
/// reference string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Generate a fresh id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a provider-supplied reference back into an id
    pub fn parse(reference: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(reference).map(Self)
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction status.
///
/// `Created` is the pre-payment state set by the upstream checkout flow.
/// A `Refunded` terminal state is a documented extension point and is not
/// implemented here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Created by checkout, payment not yet initiated
    Created,
    /// Payment initiated, awaiting provider confirmation
    Pending,
    /// Provider approved the payment
    Paid,
    /// Provider declined the payment
    Declined,
}

impl TransactionStatus {
    /// Terminal statuses never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Paid | TransactionStatus::Declined)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Created => "created",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Declined => "declined",
        }
    }

    /// Decide what a callback event means for a transaction currently in
    /// this status.
    ///
    /// From `Created` or `Pending` the event outcome is applied directly.
    /// A callback re-affirming an existing terminal status is a no-op
    /// (providers retry callbacks, so this must be safe). A callback that
    /// contradicts a terminal status is a conflict and is surfaced, never
    /// silently applied. A stale `in_progress` arriving after a terminal
    /// status is ignored.
    pub fn on_event(self, event: EventStatus) -> CallbackDecision {
        let target = event.target_status();
        match self {
            TransactionStatus::Created | TransactionStatus::Pending => {
                CallbackDecision::Apply(target)
            }
            current => {
                if target == current || target == TransactionStatus::Pending {
                    CallbackDecision::Noop
                } else {
                    CallbackDecision::Conflict
                }
            }
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of evaluating a callback event against the current status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackDecision {
    /// Persist the new status
    Apply(TransactionStatus),
    /// Already in a consistent state, nothing to write
    Noop,
    /// Event contradicts a terminal status
    Conflict,
}

/// Canonical payment outcome reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Approved,
    InProgress,
    Declined,
}

impl EventStatus {
    /// Transaction status this event maps to
    pub fn target_status(&self) -> TransactionStatus {
        match self {
            EventStatus::Approved => TransactionStatus::Paid,
            EventStatus::InProgress => TransactionStatus::Pending,
            EventStatus::Declined => TransactionStatus::Declined,
        }
    }
}

/// A provider-agnostic callback event.
///
/// Produced by a gateway adapter from raw callback input, consumed
/// immediately by the lifecycle controller and discarded; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    /// Provider-supplied reference, expected to parse as a transaction id
    pub reference: String,
    /// Canonical payment outcome
    pub status: EventStatus,
}

/// The financial record representing one attempted payment.
///
/// `total` is immutable after creation; only `status` and `ordered_at`
/// mutate during the payment flow, and only through the lifecycle
/// controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique id, doubles as the provider-facing reference
    pub id: TransactionId,

    /// Total amount to collect
    pub total: Amount,

    /// Current state-machine status
    pub status: TransactionStatus,

    /// When payment was initiated (set by `pay`, null until then)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordered_at: Option<DateTime<Utc>>,

    /// When the upstream checkout created the record
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a fresh transaction in `Created` status
    pub fn new(total: Amount) -> Self {
        Self {
            id: TransactionId::new(),
            total,
            status: TransactionStatus::Created,
            ordered_at: None,
            created_at: Utc::now(),
        }
    }

    /// Immutable snapshot handed to gateway adapters
    pub fn snapshot(&self) -> TransactionSnapshot {
        TransactionSnapshot {
            id: self.id,
            total: self.total,
        }
    }
}

/// Read-only view of a transaction for redirect construction.
///
/// Adapters receive this instead of the record itself; status mutation is
/// the controller's job and happens before the adapter is invoked.
#[derive(Debug, Clone, Copy)]
pub struct TransactionSnapshot {
    pub id: TransactionId,
    pub total: Amount,
}

/// An outbound redirect to a provider-hosted checkout
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRedirect {
    /// Provider that will host the payment flow
    pub provider: String,
    /// Absolute URL to send the payer to
    pub url: String,
}

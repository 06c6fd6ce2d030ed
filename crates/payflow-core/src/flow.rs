//! # Transaction Lifecycle Controller
//!
//! Orchestrates the two payment operations: `pay` (initiate and redirect)
//! and `callback` (reconcile an asynchronous provider confirmation). This
//! is the only component with business rules; adapters translate wire
//! formats, the store persists rows.
//!
//! Every write follows load -> compute next state -> conditional update,
//! so two racing callbacks for the same transaction can never interleave
//! into an inconsistent terminal status.

use crate::error::{PaymentError, PaymentResult, StoreError};
use crate::gateway::{CallbackRequest, GatewayRegistry, RedirectContext};
use crate::store::{CasOutcome, StatusUpdate, TransactionStore};
use crate::transaction::{
    CallbackDecision, CheckoutRedirect, TransactionId, TransactionStatus,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Bound on conditional-update retries when callbacks race each other
const MAX_CAS_ATTEMPTS: usize = 3;

/// Acknowledgement returned to the provider after a reconciled callback.
/// Providers retry on non-2xx, so this only exists on success.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackAck {
    pub reference: TransactionId,
    pub status: TransactionStatus,
}

/// The lifecycle controller.
///
/// Holds the immutable provider registry and the store boundary; both are
/// safe for unsynchronized concurrent use, so one instance serves all
/// requests.
#[derive(Clone)]
pub struct PaymentFlow {
    registry: GatewayRegistry,
    store: Arc<dyn TransactionStore>,
}

impl PaymentFlow {
    pub fn new(registry: GatewayRegistry, store: Arc<dyn TransactionStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &GatewayRegistry {
        &self.registry
    }

    /// Initiate payment: mark the transaction pending, stamp `ordered_at`,
    /// and ask the provider adapter for a hosted-checkout redirect.
    ///
    /// The status write lands before the provider call. A cancelled or
    /// failed redirect construction leaves the row pending, which is
    /// recoverable by retrying `pay`; re-paying a pending transaction
    /// refreshes `ordered_at`.
    pub async fn pay(
        &self,
        provider: &str,
        id: TransactionId,
        ctx: &RedirectContext,
    ) -> PaymentResult<CheckoutRedirect> {
        let gateway = self.registry.resolve(provider)?;

        let mut tx = self.store.find(id).await?.ok_or_else(|| {
            PaymentError::TransactionNotFound {
                reference: id.to_string(),
            }
        })?;

        for _ in 0..MAX_CAS_ATTEMPTS {
            if tx.status.is_terminal() {
                warn!(
                    provider = provider,
                    reference = %id,
                    current = %tx.status,
                    "pay requested for a settled transaction"
                );
                return Err(PaymentError::StatusConflict {
                    reference: id.to_string(),
                    current: tx.status.to_string(),
                    requested: TransactionStatus::Pending.to_string(),
                });
            }

            let update = StatusUpdate {
                status: TransactionStatus::Pending,
                ordered_at: Some(Utc::now()),
            };
            match self.store.apply(id, tx.status, update).await? {
                CasOutcome::Applied(row) => {
                    debug!(provider = provider, reference = %id, "transaction marked pending");
                    return gateway.create_redirect(&row.snapshot(), ctx).await;
                }
                // A callback landed between our read and write; re-evaluate
                CasOutcome::Raced(current) => tx = current,
            }
        }

        Err(PaymentError::Store(StoreError::Unavailable(format!(
            "update contention on transaction {}",
            id
        ))))
    }

    /// Reconcile a provider callback against the original transaction.
    ///
    /// The callback is untrusted external input: the adapter verifies it
    /// first, the reference must parse as one of our transaction ids, and
    /// the status transition is applied with a conditional write. Safe to
    /// receive the same valid callback more than once.
    pub async fn callback(
        &self,
        provider: &str,
        request: &CallbackRequest,
    ) -> PaymentResult<CallbackAck> {
        let gateway = self.registry.resolve(provider)?;

        let event = gateway.check_event(request).await?;

        let id = TransactionId::parse(&event.reference).map_err(|_| {
            error!(
                provider = provider,
                reference = %event.reference,
                "callback reference does not parse as a transaction id"
            );
            PaymentError::InvalidCallback(format!(
                "reference {:?} is not a transaction id",
                event.reference
            ))
        })?;

        let mut tx = self.store.find(id).await?.ok_or_else(|| {
            error!(
                provider = provider,
                reference = %event.reference,
                "callback references an unknown transaction"
            );
            PaymentError::TransactionNotFound {
                reference: event.reference.clone(),
            }
        })?;

        for _ in 0..MAX_CAS_ATTEMPTS {
            match tx.status.on_event(event.status) {
                CallbackDecision::Noop => {
                    debug!(
                        provider = provider,
                        reference = %id,
                        status = %tx.status,
                        "callback re-affirms current status"
                    );
                    return Ok(CallbackAck {
                        reference: id,
                        status: tx.status,
                    });
                }
                CallbackDecision::Conflict => {
                    warn!(
                        provider = provider,
                        reference = %id,
                        current = %tx.status,
                        reported = %event.status.target_status(),
                        "callback contradicts settled status, refusing to overwrite"
                    );
                    return Err(PaymentError::StatusConflict {
                        reference: id.to_string(),
                        current: tx.status.to_string(),
                        requested: event.status.target_status().to_string(),
                    });
                }
                CallbackDecision::Apply(next) => {
                    // Backfill the initiation timestamp if the provider
                    // confirmed before our pending write was observed, so a
                    // settled row never has it unset.
                    let ordered_at = if tx.ordered_at.is_none() {
                        Some(Utc::now())
                    } else {
                        None
                    };
                    let update = StatusUpdate {
                        status: next,
                        ordered_at,
                    };
                    match self.store.apply(id, tx.status, update).await? {
                        CasOutcome::Applied(row) => {
                            info!(
                                provider = provider,
                                reference = %id,
                                status = %row.status,
                                "callback reconciled"
                            );
                            return Ok(CallbackAck {
                                reference: id,
                                status: row.status,
                            });
                        }
                        CasOutcome::Raced(current) => tx = current,
                    }
                }
            }
        }

        Err(PaymentError::Store(StoreError::Unavailable(format!(
            "update contention on transaction {}",
            id
        ))))
    }
}

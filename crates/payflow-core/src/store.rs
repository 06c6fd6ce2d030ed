//! # Transaction Store Boundary
//!
//! Durable persistence is an external collaborator; the lifecycle
//! controller depends on it only through `find` and a status-conditional
//! single-row update. The conditional write keys on the expected current
//! status (optimistic concurrency) so concurrent callbacks cannot
//! interleave into an inconsistent terminal status.

use crate::error::StoreError;
use crate::transaction::{Transaction, TransactionId, TransactionStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Fields a lifecycle transition is allowed to change.
///
/// Everything else on the row (`total`, `created_at`) is immutable after
/// creation.
#[derive(Debug, Clone, Copy)]
pub struct StatusUpdate {
    /// Next status
    pub status: TransactionStatus,
    /// New initiation timestamp; `None` leaves the stored value untouched
    pub ordered_at: Option<DateTime<Utc>>,
}

/// Result of a conditional update attempt
#[derive(Debug, Clone)]
pub enum CasOutcome {
    /// Update applied; carries the row as written
    Applied(Transaction),
    /// Stored status no longer matched `expected`; carries the current row
    Raced(Transaction),
}

/// Boundary contract for transaction persistence.
///
/// Both operations are atomic per call with single-row semantics; no
/// multi-row transactions are required by this subsystem.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Load a transaction by id
    async fn find(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError>;

    /// Apply `update` only if the stored status still equals `expected`
    /// (atomic read-modify-write on a single row).
    async fn apply(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        update: StatusUpdate,
    ) -> Result<CasOutcome, StoreError>;
}

/// In-memory store with compare-and-swap semantics.
///
/// Default backing for the server when no external store is wired in, and
/// the store used by tests.
#[derive(Default)]
pub struct MemoryTransactionStore {
    rows: RwLock<HashMap<TransactionId, Transaction>>,
}

impl MemoryTransactionStore {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Seed a transaction (the upstream checkout flow, out of scope here,
    /// would normally do this)
    pub async fn insert(&self, transaction: Transaction) {
        self.rows
            .write()
            .await
            .insert(transaction.id, transaction);
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn find(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn apply(
        &self,
        id: TransactionId,
        expected: TransactionStatus,
        update: StatusUpdate,
    ) -> Result<CasOutcome, StoreError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::Missing(id.to_string()))?;

        if row.status != expected {
            return Ok(CasOutcome::Raced(row.clone()));
        }

        row.status = update.status;
        if let Some(ordered_at) = update.ordered_at {
            row.ordered_at = Some(ordered_at);
        }
        Ok(CasOutcome::Applied(row.clone()))
    }
}

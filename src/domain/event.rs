use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::transaction::Transaction;

/// A transaction change notification, delivered at least once.
///
/// `before` is absent for creations, `after` is absent for deletions; updates
/// carry both. The `event_id` identifies the delivery, not the transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub event_id: Uuid,
    pub before: Option<Transaction>,
    pub after: Option<Transaction>,
}

impl ChangeEvent {
    pub fn created(after: Transaction) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            before: None,
            after: Some(after),
        }
    }

    pub fn updated(before: Transaction, after: Transaction) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            before: Some(before),
            after: Some(after),
        }
    }

    pub fn deleted(before: Transaction) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            before: Some(before),
            after: None,
        }
    }

    /// The owning user, taken from whichever state is present.
    pub fn user_id(&self) -> Option<Uuid> {
        self.after
            .as_ref()
            .or(self.before.as_ref())
            .map(|txn| txn.user_id)
    }

    /// The transaction this event mutates.
    pub fn transaction_id(&self) -> Option<Uuid> {
        self.after
            .as_ref()
            .or(self.before.as_ref())
            .map(|txn| txn.id)
    }
}

/// Write-once record marking a change event as applied.
///
/// Its presence is the sole idempotence guard for event delivery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessedEvent {
    pub event_id: Uuid,
    pub transaction_id: Uuid,
    pub processed_at: DateTime<Utc>,
}

impl ProcessedEvent {
    pub fn new(event_id: Uuid, transaction_id: Uuid) -> Self {
        Self {
            event_id,
            transaction_id,
            processed_at: Utc::now(),
        }
    }
}

pub mod memory;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Account, HistoricalSnapshot, ProcessedEvent, Transaction};
use crate::errors::LedgerError;

pub use memory::MemoryStore;

/// A signed balance mutation for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceDelta {
    pub account_id: Uuid,
    pub delta_cents: i64,
}

impl BalanceDelta {
    pub fn new(account_id: Uuid, delta_cents: i64) -> Self {
        Self {
            account_id,
            delta_cents,
        }
    }
}

/// Result of an atomic delta application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Deltas applied and the event recorded as processed.
    Committed,
    /// The event id was already processed; nothing changed.
    Duplicate,
    /// A concurrent writer won; the caller must retry the whole operation.
    Conflict,
}

/// Abstraction over the persistence collaborator.
///
/// `apply_deltas` must perform the dedup lookup, the balance mutation, the
/// `ProcessedEvent` insert, and the optional last-entry stamp as one atomic
/// unit; checking dedup outside that unit reintroduces a race under retries.
pub trait LedgerStore: Send + Sync {
    fn apply_deltas(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        transaction_id: Uuid,
        deltas: &[BalanceDelta],
        touch_last_entry: bool,
    ) -> Result<CommitOutcome, LedgerError>;

    fn balances(&self, user_id: Uuid) -> Result<BTreeMap<Uuid, i64>, LedgerError>;
    fn transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, LedgerError>;
    fn accounts(&self, user_id: Uuid) -> Result<Vec<Account>, LedgerError>;
    fn processed_event(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<ProcessedEvent>, LedgerError>;
    fn last_entry_at(&self, user_id: Uuid) -> Result<Option<DateTime<Utc>>, LedgerError>;

    fn save_history(
        &self,
        user_id: Uuid,
        snapshots: &[HistoricalSnapshot],
    ) -> Result<(), LedgerError>;
    fn load_history(&self, user_id: Uuid) -> Result<Vec<HistoricalSnapshot>, LedgerError>;
}

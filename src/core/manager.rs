//! Facade wiring the event processor, reconstructor, and billing engine
//! against one storage backend.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::core::billing::{Bill, BillingEngine};
use crate::core::networth::NetWorthReconstructor;
use crate::core::processor::{ApplyOutcome, EventProcessor};
use crate::domain::{ChangeEvent, HistoricalSnapshot};
use crate::errors::LedgerError;
use crate::storage::LedgerStore;

/// Coordinates the ledger core against a storage backend.
pub struct LedgerCore {
    store: Arc<dyn LedgerStore>,
    processor: EventProcessor,
    reconstructor: NetWorthReconstructor,
}

impl LedgerCore {
    pub fn new(store: Arc<dyn LedgerStore>, config: CoreConfig) -> Self {
        let processor =
            EventProcessor::with_max_attempts(Arc::clone(&store), config.max_apply_attempts);
        let reconstructor = NetWorthReconstructor::new(config.adjustment_category_id);
        Self {
            store,
            processor,
            reconstructor,
        }
    }

    /// Applies a change event, then refreshes the user's historical series.
    ///
    /// Duplicate deliveries skip the refresh; the series is a pure function
    /// of the transaction log, so re-running it after every applied mutation
    /// is safe.
    pub fn handle_change(&self, event: &ChangeEvent) -> Result<ApplyOutcome, LedgerError> {
        let outcome = self.processor.process(event)?;
        if outcome == ApplyOutcome::Applied {
            if let Some(user_id) = event.user_id() {
                self.rebuild_history(user_id)?;
            }
        }
        Ok(outcome)
    }

    /// Recomputes and persists the net-worth series for one user.
    ///
    /// A user with no transactions produces no snapshots and nothing is
    /// written.
    pub fn rebuild_history(&self, user_id: Uuid) -> Result<Vec<HistoricalSnapshot>, LedgerError> {
        let transactions = self.store.transactions(user_id)?;
        let balances = self.store.balances(user_id)?;
        let current_total: i64 = balances.values().sum();
        let today = Utc::now().date_naive();
        let snapshots = self
            .reconstructor
            .reconstruct(&transactions, current_total, today);
        if !snapshots.is_empty() {
            self.store.save_history(user_id, &snapshots)?;
        }
        Ok(snapshots)
    }

    /// Current per-account balances for a user.
    pub fn balances(&self, user_id: Uuid) -> Result<BTreeMap<Uuid, i64>, LedgerError> {
        self.store.balances(user_id)
    }

    /// The persisted net-worth series, oldest month first.
    pub fn history(&self, user_id: Uuid) -> Result<Vec<HistoricalSnapshot>, LedgerError> {
        self.store.load_history(user_id)
    }

    /// All bills derived from the user's transactions and billing rules.
    pub fn bills(&self, user_id: Uuid) -> Result<Vec<Bill>, LedgerError> {
        let transactions = self.store.transactions(user_id)?;
        let accounts = self.store.accounts(user_id)?;
        Ok(BillingEngine::build_bills(&transactions, &accounts))
    }

    /// Bills with a positive remaining amount.
    pub fn unpaid_bills(&self, user_id: Uuid) -> Result<Vec<Bill>, LedgerError> {
        let transactions = self.store.transactions(user_id)?;
        let accounts = self.store.accounts(user_id)?;
        Ok(BillingEngine::unpaid_bills(&transactions, &accounts))
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }
}

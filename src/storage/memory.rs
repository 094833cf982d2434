use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Account, HistoricalSnapshot, ProcessedEvent, Transaction};
use crate::errors::LedgerError;
use crate::storage::{BalanceDelta, CommitOutcome, LedgerStore};

/// One user's persisted state. The version counter stands in for the store's
/// optimistic-concurrency token and bumps on every committed apply.
#[derive(Debug, Default)]
struct UserDocument {
    version: u64,
    balances: BTreeMap<Uuid, i64>,
    processed: HashMap<Uuid, ProcessedEvent>,
    transactions: BTreeMap<Uuid, Transaction>,
    accounts: BTreeMap<Uuid, Account>,
    history: Vec<HistoricalSnapshot>,
    last_entry_at: Option<DateTime<Utc>>,
}

/// Reference in-memory backend.
///
/// A single mutex per store gives the serializable read-modify-write the
/// trait contract demands; a database-backed implementation would use its
/// native transactions instead.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<HashMap<Uuid, UserDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a transaction, modelling the UI layer's write path.
    pub fn upsert_transaction(&self, transaction: Transaction) -> Result<(), LedgerError> {
        let mut docs = self.lock()?;
        let doc = docs.entry(transaction.user_id).or_default();
        doc.transactions.insert(transaction.id, transaction);
        Ok(())
    }

    /// Removes a transaction, returning it when present.
    pub fn remove_transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Option<Transaction>, LedgerError> {
        let mut docs = self.lock()?;
        Ok(docs
            .get_mut(&user_id)
            .and_then(|doc| doc.transactions.remove(&transaction_id)))
    }

    /// Inserts or replaces account metadata for a user.
    pub fn upsert_account(&self, user_id: Uuid, account: Account) -> Result<(), LedgerError> {
        let mut docs = self.lock()?;
        let doc = docs.entry(user_id).or_default();
        doc.accounts.insert(account.id, account);
        Ok(())
    }

    /// The current document version for a user, zero when absent.
    pub fn document_version(&self, user_id: Uuid) -> Result<u64, LedgerError> {
        let docs = self.lock()?;
        Ok(docs.get(&user_id).map(|doc| doc.version).unwrap_or(0))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, UserDocument>>, LedgerError> {
        self.documents
            .lock()
            .map_err(|_| LedgerError::Storage("memory store mutex poisoned".into()))
    }
}

impl LedgerStore for MemoryStore {
    fn apply_deltas(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        transaction_id: Uuid,
        deltas: &[BalanceDelta],
        touch_last_entry: bool,
    ) -> Result<CommitOutcome, LedgerError> {
        let mut docs = self.lock()?;
        let doc = docs.entry(user_id).or_default();
        if doc.processed.contains_key(&event_id) {
            return Ok(CommitOutcome::Duplicate);
        }
        for delta in deltas {
            let balance = doc.balances.entry(delta.account_id).or_insert(0);
            *balance += delta.delta_cents;
        }
        doc.processed
            .insert(event_id, ProcessedEvent::new(event_id, transaction_id));
        if touch_last_entry {
            doc.last_entry_at = Some(Utc::now());
        }
        doc.version += 1;
        Ok(CommitOutcome::Committed)
    }

    fn balances(&self, user_id: Uuid) -> Result<BTreeMap<Uuid, i64>, LedgerError> {
        let docs = self.lock()?;
        Ok(docs
            .get(&user_id)
            .map(|doc| doc.balances.clone())
            .unwrap_or_default())
    }

    fn transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, LedgerError> {
        let docs = self.lock()?;
        Ok(docs
            .get(&user_id)
            .map(|doc| doc.transactions.values().cloned().collect())
            .unwrap_or_default())
    }

    fn accounts(&self, user_id: Uuid) -> Result<Vec<Account>, LedgerError> {
        let docs = self.lock()?;
        Ok(docs
            .get(&user_id)
            .map(|doc| doc.accounts.values().cloned().collect())
            .unwrap_or_default())
    }

    fn processed_event(
        &self,
        user_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<ProcessedEvent>, LedgerError> {
        let docs = self.lock()?;
        Ok(docs
            .get(&user_id)
            .and_then(|doc| doc.processed.get(&event_id).cloned()))
    }

    fn last_entry_at(&self, user_id: Uuid) -> Result<Option<DateTime<Utc>>, LedgerError> {
        let docs = self.lock()?;
        Ok(docs.get(&user_id).and_then(|doc| doc.last_entry_at))
    }

    fn save_history(
        &self,
        user_id: Uuid,
        snapshots: &[HistoricalSnapshot],
    ) -> Result<(), LedgerError> {
        let mut docs = self.lock()?;
        let doc = docs.entry(user_id).or_default();
        doc.history = snapshots.to_vec();
        Ok(())
    }

    fn load_history(&self, user_id: Uuid) -> Result<Vec<HistoricalSnapshot>, LedgerError> {
        let docs = self.lock()?;
        Ok(docs
            .get(&user_id)
            .map(|doc| doc.history.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delta(account: Uuid, cents: i64) -> BalanceDelta {
        BalanceDelta::new(account, cents)
    }

    #[test]
    fn apply_records_event_and_mutates_balances() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let account = Uuid::new_v4();
        let event = Uuid::new_v4();
        let txn = Uuid::new_v4();

        let outcome = store
            .apply_deltas(user, event, txn, &[delta(account, 1500)], true)
            .expect("apply succeeds");
        assert_eq!(outcome, CommitOutcome::Committed);
        assert_eq!(store.balances(user).unwrap().get(&account), Some(&1500));
        let processed = store
            .processed_event(user, event)
            .unwrap()
            .expect("event recorded");
        assert_eq!(processed.transaction_id, txn);
        assert!(store.last_entry_at(user).unwrap().is_some());
    }

    #[test]
    fn duplicate_event_is_a_no_op() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let account = Uuid::new_v4();
        let event = Uuid::new_v4();

        store
            .apply_deltas(user, event, Uuid::new_v4(), &[delta(account, 700)], false)
            .expect("first apply");
        let outcome = store
            .apply_deltas(user, event, Uuid::new_v4(), &[delta(account, 700)], false)
            .expect("second apply");
        assert_eq!(outcome, CommitOutcome::Duplicate);
        assert_eq!(store.balances(user).unwrap().get(&account), Some(&700));
    }

    #[test]
    fn version_bumps_only_on_commit() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let event = Uuid::new_v4();

        assert_eq!(store.document_version(user).unwrap(), 0);
        store
            .apply_deltas(user, event, Uuid::new_v4(), &[], false)
            .expect("apply");
        assert_eq!(store.document_version(user).unwrap(), 1);
        store
            .apply_deltas(user, event, Uuid::new_v4(), &[], false)
            .expect("duplicate apply");
        assert_eq!(store.document_version(user).unwrap(), 1);
    }

    #[test]
    fn deletion_stamp_skipped_when_no_after_state() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store
            .apply_deltas(user, Uuid::new_v4(), Uuid::new_v4(), &[], false)
            .expect("apply");
        assert!(store.last_entry_at(user).unwrap().is_none());
    }

    #[test]
    fn history_round_trips() {
        use crate::domain::{HistoricalSnapshot, MonthKey};

        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let snapshots = vec![HistoricalSnapshot {
            month: MonthKey::new(2024, 1),
            net_worth_cents: 1500,
            income_cents: 2000,
            expense_cents: 500,
        }];
        store.save_history(user, &snapshots).expect("save");
        assert_eq!(store.load_history(user).unwrap(), snapshots);
    }
}

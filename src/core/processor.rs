//! Applies transaction change events to account balances exactly once.

use std::collections::BTreeMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{ChangeEvent, Transaction, TransactionKind};
use crate::errors::LedgerError;
use crate::storage::{BalanceDelta, CommitOutcome, LedgerStore};

pub const DEFAULT_MAX_APPLY_ATTEMPTS: u32 = 5;

/// Outcome of processing a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The event's net effect was committed.
    Applied,
    /// The event id had already been applied; nothing changed.
    Duplicate,
}

/// The signed balance effects of a transaction, one entry per affected leg.
///
/// Missing account ids drop their leg, unknown kinds contribute nothing, and
/// negative amounts count as zero. Pure: safe to recompute on every retry.
pub fn forward_effects(transaction: &Transaction) -> Vec<(Uuid, i64)> {
    let amount = transaction.magnitude_cents();
    let mut effects = Vec::with_capacity(2);
    match transaction.kind {
        TransactionKind::Income => {
            if let Some(account) = transaction.account_id {
                effects.push((account, amount));
            }
        }
        TransactionKind::Expense => {
            if let Some(account) = transaction.account_id {
                effects.push((account, -amount));
            }
        }
        TransactionKind::Transfer => {
            if let Some(from) = transaction.from_account_id {
                effects.push((from, -amount));
            }
            if let Some(to) = transaction.to_account_id {
                effects.push((to, amount));
            }
        }
        TransactionKind::Unknown => {
            tracing::warn!(
                transaction_id = %transaction.id,
                "unrecognized transaction kind contributes no balance effect"
            );
        }
    }
    effects
}

/// The exact inverse of [`forward_effects`].
pub fn reverse_effects(transaction: &Transaction) -> Vec<(Uuid, i64)> {
    forward_effects(transaction)
        .into_iter()
        .map(|(account, delta)| (account, -delta))
        .collect()
}

/// Merges the reverse of the prior state with the forward of the new state
/// into one delta per account, dropping legs that cancel out.
pub fn balance_deltas(event: &ChangeEvent) -> Vec<BalanceDelta> {
    let mut merged: BTreeMap<Uuid, i64> = BTreeMap::new();
    if let Some(before) = &event.before {
        for (account, delta) in reverse_effects(before) {
            *merged.entry(account).or_insert(0) += delta;
        }
    }
    if let Some(after) = &event.after {
        for (account, delta) in forward_effects(after) {
            *merged.entry(account).or_insert(0) += delta;
        }
    }
    merged
        .into_iter()
        .filter(|(_, delta)| *delta != 0)
        .map(|(account, delta)| BalanceDelta::new(account, delta))
        .collect()
}

/// Consumes change events and applies their net effect atomically.
pub struct EventProcessor {
    store: Arc<dyn LedgerStore>,
    max_attempts: u32,
}

impl EventProcessor {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self::with_max_attempts(store, DEFAULT_MAX_APPLY_ATTEMPTS)
    }

    pub fn with_max_attempts(store: Arc<dyn LedgerStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Applies a change event exactly once.
    ///
    /// The dedup check, balance mutation, processed-event insert, and
    /// last-entry stamp all happen inside the store's atomic unit; this
    /// method only computes the (pure) deltas and retries on conflict.
    pub fn process(&self, event: &ChangeEvent) -> Result<ApplyOutcome, LedgerError> {
        let user_id = event.user_id().ok_or_else(|| {
            LedgerError::InvalidRef(format!(
                "change event {} carries neither before nor after state",
                event.event_id
            ))
        })?;
        let transaction_id = event.transaction_id().ok_or_else(|| {
            LedgerError::InvalidRef(format!(
                "change event {} names no transaction",
                event.event_id
            ))
        })?;
        let deltas = balance_deltas(event);
        let touch_last_entry = event.after.is_some();

        for attempt in 1..=self.max_attempts {
            match self.store.apply_deltas(
                user_id,
                event.event_id,
                transaction_id,
                &deltas,
                touch_last_entry,
            )? {
                CommitOutcome::Committed => {
                    tracing::debug!(event_id = %event.event_id, %user_id, "change event applied");
                    return Ok(ApplyOutcome::Applied);
                }
                CommitOutcome::Duplicate => {
                    tracing::debug!(event_id = %event.event_id, "duplicate delivery ignored");
                    return Ok(ApplyOutcome::Duplicate);
                }
                CommitOutcome::Conflict => {
                    tracing::debug!(event_id = %event.event_id, attempt, "apply conflict, retrying");
                }
            }
        }
        Err(LedgerError::Conflict {
            attempts: self.max_attempts,
        })
    }
}

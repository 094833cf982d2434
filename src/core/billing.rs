//! Statement cycles and payment reconciliation for liability accounts.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::dates::{clamped_date, days_in_month, shift_month};
use crate::domain::{Account, BillingRule, Transaction, TransactionKind};

/// A nominal closing day at or past 31 always falls on month-end, so the
/// cycle degenerates to the full calendar month.
const FULL_MONTH_CLOSING_DAY: u32 = 31;

/// One statement for one liability account, recomputed on read.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Bill {
    pub account_id: Uuid,
    pub closing_date: NaiveDate,
    pub due_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub amount_cents: i64,
    pub paid_cents: i64,
}

impl Bill {
    pub fn remaining_cents(&self) -> i64 {
        self.amount_cents - self.paid_cents
    }

    pub fn is_settled(&self) -> bool {
        self.remaining_cents() <= 0
    }
}

/// Pure date math plus bill aggregation; reads everything, writes nothing.
pub struct BillingEngine;

impl BillingEngine {
    /// The closing date of the cycle a charge belongs to.
    ///
    /// The nominal closing day is clamped to the charge month's length. A
    /// charge past the clamped closing day rolls into the next cycle, as
    /// does a charge landing exactly on a clamped month-end closing: with
    /// `closing_day = 31` a Feb 15 charge closes on Feb 28/29 while a
    /// Feb 29 charge closes on Mar 31.
    pub fn closing_date_for(charge_date: NaiveDate, closing_day: u32) -> NaiveDate {
        let year = charge_date.year();
        let month = charge_date.month();
        let month_len = days_in_month(year, month);
        let clamped = closing_day.min(month_len);
        let rolls_over = charge_date.day() > clamped
            || (closing_day > month_len && charge_date.day() == clamped);
        if rolls_over {
            let next = shift_month(charge_date.with_day(1).unwrap_or(charge_date), 1);
            clamped_date(next.year(), next.month(), closing_day)
        } else {
            clamped_date(year, month, closing_day)
        }
    }

    /// The due date for a cycle: the closing month advanced by the rule's
    /// offset, on the payment day clamped to that month.
    pub fn payment_due_date(closing_date: NaiveDate, rule: &BillingRule) -> NaiveDate {
        let target = shift_month(closing_date, rule.payment_month_offset.max(1) as i32);
        clamped_date(target.year(), target.month(), rule.payment_day)
    }

    /// The inclusive date range a statement covers.
    ///
    /// Starts the day after the previous cycle's closing, except that a
    /// month-end rule labels the cycle as the full closing month.
    pub fn billing_period(closing_date: NaiveDate, closing_day: u32) -> (NaiveDate, NaiveDate) {
        if closing_day >= FULL_MONTH_CLOSING_DAY {
            let start = clamped_date(closing_date.year(), closing_date.month(), 1);
            return (start, closing_date);
        }
        let previous = shift_month(closing_date, -1);
        let previous_closing = clamped_date(previous.year(), previous.month(), closing_day);
        (previous_closing + Duration::days(1), closing_date)
    }

    /// Derives every bill for the user's liability accounts.
    ///
    /// Charges are expenses against the account or transfers out of it,
    /// grouped by closing date under the account's rule; payment-linked
    /// transfers credit the matching cycle. Accounts without a rule are
    /// skipped. Rules apply to all history, so a newly configured rule
    /// retroactively buckets old charges.
    pub fn build_bills(transactions: &[Transaction], accounts: &[Account]) -> Vec<Bill> {
        let mut rules: BTreeMap<Uuid, &BillingRule> = BTreeMap::new();
        for account in accounts.iter().filter(|account| account.is_billable()) {
            match &account.billing_rule {
                Some(rule) => {
                    rules.insert(account.id, rule);
                }
                None => {
                    tracing::debug!(account_id = %account.id, "liability account has no billing rule");
                }
            }
        }

        let mut charges: BTreeMap<(Uuid, NaiveDate), i64> = BTreeMap::new();
        for txn in transactions {
            let charged_account = match txn.kind {
                TransactionKind::Expense => txn.account_id,
                TransactionKind::Transfer => txn.from_account_id,
                TransactionKind::Income | TransactionKind::Unknown => None,
            };
            let Some(account_id) = charged_account else {
                continue;
            };
            let Some(rule) = rules.get(&account_id) else {
                continue;
            };
            let closing = Self::closing_date_for(txn.date, rule.closing_day);
            *charges.entry((account_id, closing)).or_insert(0) += txn.magnitude_cents();
        }

        let mut bills: Vec<Bill> = charges
            .into_iter()
            .filter_map(|((account_id, closing_date), amount_cents)| {
                let rule = rules.get(&account_id)?;
                let (period_start, period_end) =
                    Self::billing_period(closing_date, rule.closing_day);
                Some(Bill {
                    account_id,
                    closing_date,
                    due_date: Self::payment_due_date(closing_date, rule),
                    period_start,
                    period_end,
                    amount_cents,
                    paid_cents: 0,
                })
            })
            .collect();

        for txn in transactions {
            if txn.kind != TransactionKind::Transfer {
                continue;
            }
            let Some(link) = &txn.payment_link else {
                continue;
            };
            match bills.iter_mut().find(|bill| {
                bill.account_id == link.card_id && bill.closing_date == link.closing_date
            }) {
                Some(bill) => bill.paid_cents += txn.magnitude_cents(),
                None => {
                    tracing::debug!(
                        transaction_id = %txn.id,
                        card_id = %link.card_id,
                        closing_date = %link.closing_date,
                        "payment link matches no billing cycle"
                    );
                }
            }
        }
        bills
    }

    /// Bills that still carry a positive remaining amount.
    pub fn unpaid_bills(transactions: &[Transaction], accounts: &[Account]) -> Vec<Bill> {
        Self::build_bills(transactions, accounts)
            .into_iter()
            .filter(|bill| !bill.is_settled())
            .collect()
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{Displayable, Identifiable};

/// A ledger transaction. Immutable by replacement: edits arrive as a
/// before/after pair on a change event, never as in-place mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TransactionKind,
    /// Non-negative magnitude in cents. Malformed input deserializes to zero.
    #[serde(default)]
    pub amount_cents: i64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_account_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_link: Option<PaymentLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Transaction {
    /// Creates an income posting against `account_id`.
    pub fn income(user_id: Uuid, account_id: Uuid, amount_cents: i64, date: NaiveDate) -> Self {
        Self::base(user_id, TransactionKind::Income, amount_cents, date).with_account(account_id)
    }

    /// Creates an expense posting against `account_id`.
    pub fn expense(user_id: Uuid, account_id: Uuid, amount_cents: i64, date: NaiveDate) -> Self {
        Self::base(user_id, TransactionKind::Expense, amount_cents, date).with_account(account_id)
    }

    /// Creates a transfer between two accounts.
    pub fn transfer(
        user_id: Uuid,
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount_cents: i64,
        date: NaiveDate,
    ) -> Self {
        let mut txn = Self::base(user_id, TransactionKind::Transfer, amount_cents, date);
        txn.from_account_id = Some(from_account_id);
        txn.to_account_id = Some(to_account_id);
        txn
    }

    fn base(user_id: Uuid, kind: TransactionKind, amount_cents: i64, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            amount_cents,
            date,
            category_id: None,
            account_id: None,
            from_account_id: None,
            to_account_id: None,
            payment_link: None,
            notes: None,
        }
    }

    fn with_account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn with_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Tags the transaction as settling a specific billing cycle.
    pub fn with_payment_link(mut self, link: PaymentLink) -> Self {
        self.payment_link = Some(link);
        self
    }

    /// The magnitude used for balance effects; negative input counts as zero.
    pub fn magnitude_cents(&self) -> i64 {
        self.amount_cents.max(0)
    }
}

impl Identifiable for Transaction {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Transaction {
    fn display_label(&self) -> String {
        format!("txn:{} [{:?}]", self.id, self.kind)
    }
}

/// Enumerates the supported transaction kinds.
///
/// Unrecognized kinds deserialize to `Unknown` so future producers do not
/// break the processor; they contribute no balance effect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
    #[serde(other)]
    Unknown,
}

/// Links a transfer to the billing cycle it settles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentLink {
    pub card_id: Uuid,
    pub closing_date: NaiveDate,
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{Displayable, Identifiable};

/// Represents a financial account tracked within the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub kind: AccountKind,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_rule: Option<BillingRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Account {
    /// Creates a new active account of the provided kind.
    pub fn new(name: impl Into<String>, kind: AccountKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            is_deleted: false,
            billing_rule: None,
            notes: None,
        }
    }

    /// Attaches a billing rule, replacing any previously active one.
    pub fn with_billing_rule(mut self, rule: BillingRule) -> Self {
        self.billing_rule = Some(rule);
        self
    }

    /// True for liability accounts that still participate in billing.
    pub fn is_billable(&self) -> bool {
        self.kind == AccountKind::Liability && !self.is_deleted
    }
}

impl Identifiable for Account {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for Account {
    fn display_label(&self) -> String {
        format!("{} ({:?})", self.name, self.kind)
    }
}

/// Enumerates the supported account classifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountKind {
    Asset,
    Liability,
}

/// Statement configuration for a liability account.
///
/// `closing_day` and `payment_day` are nominal days of month (1-31) and are
/// clamped to each target month's length when dates are materialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillingRule {
    pub closing_day: u32,
    pub payment_month_offset: u32,
    pub payment_day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_payment_account_id: Option<Uuid>,
}

impl BillingRule {
    pub fn new(closing_day: u32, payment_month_offset: u32, payment_day: u32) -> Self {
        Self {
            closing_day,
            payment_month_offset: payment_month_offset.max(1),
            payment_day,
            default_payment_account_id: None,
        }
    }

    pub fn with_default_payment_account(mut self, account_id: Uuid) -> Self {
        self.default_payment_account_id = Some(account_id);
        self
    }
}

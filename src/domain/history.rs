use serde::{Deserialize, Serialize};

use crate::domain::dates::MonthKey;

/// Per-month income/expense totals, ephemeral scratch for reconstruction.
///
/// `net_change_cents` may differ from `income - expense` when an adjustment
/// category is configured: adjustments move net worth without counting as
/// reportable income or expense.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthlySummary {
    pub income_cents: i64,
    pub expense_cents: i64,
    pub net_change_cents: i64,
}

impl MonthlySummary {
    pub fn add_income(&mut self, amount_cents: i64, adjustment: bool) {
        if !adjustment {
            self.income_cents += amount_cents;
        }
        self.net_change_cents += amount_cents;
    }

    pub fn add_expense(&mut self, amount_cents: i64, adjustment: bool) {
        if !adjustment {
            self.expense_cents += amount_cents;
        }
        self.net_change_cents -= amount_cents;
    }
}

/// One month of reconstructed net-worth history, persisted oldest to newest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoricalSnapshot {
    pub month: MonthKey,
    pub net_worth_cents: i64,
    pub income_cents: i64,
    pub expense_cents: i64,
}

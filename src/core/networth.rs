//! Rebuilds the monthly net-worth series from the transaction history.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{HistoricalSnapshot, MonthKey, MonthlySummary, Transaction, TransactionKind};

/// Safety bound on the backward walk. Twenty years of monthly snapshots is
/// far beyond any plausible history; hitting it means corrupted dates.
pub const HISTORY_MONTHS_CAP: usize = 240;

/// Derives the historical net-worth series for one user.
pub struct NetWorthReconstructor {
    adjustment_category_id: Option<Uuid>,
}

impl NetWorthReconstructor {
    pub fn new(adjustment_category_id: Option<Uuid>) -> Self {
        Self {
            adjustment_category_id,
        }
    }

    /// Aggregates income/expense per calendar month in a single scan.
    ///
    /// Transfers move money between tracked accounts and never change net
    /// worth, so they are skipped; unknown kinds are skipped likewise. The
    /// adjustment category contributes to net change only.
    pub fn monthly_summaries(
        &self,
        transactions: &[Transaction],
    ) -> BTreeMap<MonthKey, MonthlySummary> {
        let mut summaries: BTreeMap<MonthKey, MonthlySummary> = BTreeMap::new();
        for txn in transactions {
            let adjustment = self.adjustment_category_id.is_some()
                && txn.category_id == self.adjustment_category_id;
            let month = MonthKey::from_date(txn.date);
            match txn.kind {
                TransactionKind::Income => summaries
                    .entry(month)
                    .or_default()
                    .add_income(txn.magnitude_cents(), adjustment),
                TransactionKind::Expense => summaries
                    .entry(month)
                    .or_default()
                    .add_expense(txn.magnitude_cents(), adjustment),
                TransactionKind::Transfer | TransactionKind::Unknown => {}
            }
        }
        summaries
    }

    /// Walks backward from the current total balance through every month down
    /// to the oldest transaction, returning snapshots ordered oldest first.
    ///
    /// A user with no transactions yields an empty series. The walk is capped
    /// at [`HISTORY_MONTHS_CAP`] months; truncation is an operator signal,
    /// not an error.
    pub fn reconstruct(
        &self,
        transactions: &[Transaction],
        current_total_cents: i64,
        today: NaiveDate,
    ) -> Vec<HistoricalSnapshot> {
        let summaries = self.monthly_summaries(transactions);
        let oldest_month = match transactions.iter().map(|txn| txn.date).min() {
            Some(date) => MonthKey::from_date(date),
            None => return Vec::new(),
        };
        let current_month = MonthKey::from_date(today);

        let mut snapshots = Vec::new();
        let mut net_worth = current_total_cents;
        let mut month = current_month;
        loop {
            let summary = summaries.get(&month).copied().unwrap_or_default();
            snapshots.push(HistoricalSnapshot {
                month,
                net_worth_cents: net_worth,
                income_cents: summary.income_cents,
                expense_cents: summary.expense_cents,
            });
            net_worth -= summary.net_change_cents;
            if month <= oldest_month {
                break;
            }
            if snapshots.len() >= HISTORY_MONTHS_CAP {
                tracing::warn!(
                    months = snapshots.len(),
                    %oldest_month,
                    "net-worth reconstruction truncated at safety cap"
                );
                break;
            }
            month = month.previous();
        }
        snapshots.reverse();
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn income(amount: i64, date: NaiveDate) -> Transaction {
        Transaction::income(Uuid::nil(), Uuid::new_v4(), amount, date)
    }

    fn expense(amount: i64, date: NaiveDate) -> Transaction {
        Transaction::expense(Uuid::nil(), Uuid::new_v4(), amount, date)
    }

    #[test]
    fn empty_history_yields_no_snapshots() {
        let reconstructor = NetWorthReconstructor::new(None);
        assert!(reconstructor
            .reconstruct(&[], 5000, ymd(2024, 6, 1))
            .is_empty());
    }

    #[test]
    fn series_spans_oldest_month_through_today() {
        let reconstructor = NetWorthReconstructor::new(None);
        let transactions = vec![
            income(2000, ymd(2024, 1, 15)),
            expense(500, ymd(2024, 2, 10)),
        ];
        let series = reconstructor.reconstruct(&transactions, 1500, ymd(2024, 4, 20));

        let months: Vec<String> = series.iter().map(|s| s.month.to_string()).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03", "2024-04"]);
        assert_eq!(series.last().unwrap().net_worth_cents, 1500);
    }

    #[test]
    fn walking_forward_reproduces_current_net_worth() {
        let reconstructor = NetWorthReconstructor::new(None);
        let transactions = vec![
            income(300_000, ymd(2023, 11, 1)),
            expense(120_000, ymd(2023, 12, 24)),
            income(50_000, ymd(2024, 2, 5)),
            expense(80_000, ymd(2024, 2, 18)),
        ];
        let current = 300_000 - 120_000 + 50_000 - 80_000;
        let series = reconstructor.reconstruct(&transactions, current, ymd(2024, 3, 31));

        for pair in series.windows(2) {
            let net_change = pair[1].income_cents - pair[1].expense_cents;
            assert_eq!(
                pair[0].net_worth_cents + net_change,
                pair[1].net_worth_cents,
                "conservation violated between {} and {}",
                pair[0].month,
                pair[1].month
            );
        }
        assert_eq!(series.last().unwrap().net_worth_cents, current);
    }

    #[test]
    fn transfers_do_not_affect_the_series() {
        let reconstructor = NetWorthReconstructor::new(None);
        let transactions = vec![
            income(1000, ymd(2024, 1, 5)),
            Transaction::transfer(
                Uuid::nil(),
                Uuid::new_v4(),
                Uuid::new_v4(),
                900,
                ymd(2024, 1, 10),
            ),
        ];
        let series = reconstructor.reconstruct(&transactions, 1000, ymd(2024, 1, 31));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].income_cents, 1000);
        assert_eq!(series[0].expense_cents, 0);
    }

    #[test]
    fn adjustment_category_moves_net_change_only() {
        let adjustment = Uuid::new_v4();
        let reconstructor = NetWorthReconstructor::new(Some(adjustment));
        let transactions = vec![
            income(1000, ymd(2024, 1, 5)),
            income(500, ymd(2024, 1, 6)).with_category(adjustment),
        ];
        let series = reconstructor.reconstruct(&transactions, 1500, ymd(2024, 2, 15));

        // January reports only the plain income, but its net change of 1500
        // still closes the gap to February's balance.
        assert_eq!(series[0].income_cents, 1000);
        assert_eq!(series[0].net_worth_cents, 1500);
        assert_eq!(series[1].net_worth_cents, 1500);
    }

    #[test]
    fn current_month_is_synthesized_when_quiet() {
        let reconstructor = NetWorthReconstructor::new(None);
        let transactions = vec![income(700, ymd(2024, 3, 10))];
        let series = reconstructor.reconstruct(&transactions, 700, ymd(2024, 5, 2));

        let last = series.last().unwrap();
        assert_eq!(last.month, MonthKey::new(2024, 5));
        assert_eq!(last.income_cents, 0);
        assert_eq!(last.expense_cents, 0);
        assert_eq!(last.net_worth_cents, 700);
    }

    #[test]
    fn walk_truncates_at_safety_cap() {
        let reconstructor = NetWorthReconstructor::new(None);
        let transactions = vec![income(100, ymd(1990, 1, 1))];
        let series = reconstructor.reconstruct(&transactions, 100, ymd(2024, 6, 1));
        assert_eq!(series.len(), HISTORY_MONTHS_CAP);
        assert_eq!(series.last().unwrap().month, MonthKey::new(2024, 6));
    }
}

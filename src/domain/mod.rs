pub mod account;
pub mod common;
pub mod dates;
pub mod event;
pub mod history;
pub mod transaction;

pub use account::{Account, AccountKind, BillingRule};
pub use dates::MonthKey;
pub use event::{ChangeEvent, ProcessedEvent};
pub use history::{HistoricalSnapshot, MonthlySummary};
pub use transaction::{PaymentLink, Transaction, TransactionKind};

pub mod billing;
pub mod manager;
pub mod networth;
pub mod processor;

pub use billing::{Bill, BillingEngine};
pub use manager::LedgerCore;
pub use networth::NetWorthReconstructor;
pub use processor::{ApplyOutcome, EventProcessor};

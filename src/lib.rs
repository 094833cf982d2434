#![doc(test(attr(deny(warnings))))]

//! Ledger Core maintains per-account balances derived from a log of
//! income/expense/transfer events, reconstructs a monthly net-worth history,
//! and computes credit-card billing cycles with payment reconciliation.

pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Ledger Core tracing initialized.");
    });
}

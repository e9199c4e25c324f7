//! Local personal finance ledger.
//!
//! Tracks expenses filed under user-defined categories and incomes,
//! answers date-scoped queries, computes spending statistics, and
//! exports or imports the whole ledger as a versioned JSON backup.
//!
//! [`tracker::Tracker`] is the entry point. It owns the
//! [`categories::CategoryStore`] and [`ledger::LedgerStore`], persists
//! through a [`storage::KeyValueStore`], and notifies subscribers after
//! each change.

pub mod backup;
pub mod categories;
pub mod error;
pub mod filter;
pub mod ledger;
pub mod models;
pub mod period;
#[cfg(feature = "async")]
pub mod shared;
pub mod statistics;
pub mod storage;
pub mod tracker;

//! Data models for ledger entities.
//!
//! This module contains the live category, expense and income types,
//! newtype ID wrappers, and the derived statistic views.

mod category;
mod entry;
mod expense;
mod ids;
mod income;
mod statistics;

pub use category::{Category, default_categories};
pub use entry::LedgerEntry;
pub use expense::{Expense, ExpenseRecord};
pub use ids::{CategoryId, ExpenseId, IncomeId};
pub use income::Income;
pub use statistics::{BalanceSummary, CategoryStatistic, MonthlyStatistic, PeriodComparison};

/// Re-exported so callers can build day and month queries without
/// depending on `chrono` directly.
pub use chrono::NaiveDate;

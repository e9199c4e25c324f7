//! Derived statistic views. None of these are persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Category;

/// Spending total for one category within a selection of expenses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStatistic {
    /// The category the total belongs to.
    pub category: Category,
    /// Sum of amounts filed under the category.
    pub total: f64,
    /// Share of the grand total, in percent (0 when the grand total is 0).
    pub percentage: f64,
}

/// Total for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyStatistic {
    /// First instant of the month (UTC).
    pub month: DateTime<Utc>,
    /// Sum of amounts dated within the month.
    pub total: f64,
}

/// Totals of two periods and the relative change between them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodComparison {
    /// Total of the current period.
    pub current: f64,
    /// Total of the previous period.
    pub previous: f64,
    /// `(current - previous) / previous * 100`, or 0 when `previous` is 0.
    pub percent_change: f64,
}

/// Income against spending over the same selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalanceSummary {
    /// Sum of incomes.
    pub income_total: f64,
    /// Sum of expenses.
    pub expense_total: f64,
    /// `income_total - expense_total`.
    pub balance: f64,
}

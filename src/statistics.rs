//! Aggregations over caller-supplied expense and income selections.
//!
//! Every function here is pure: it takes a slice and returns a derived
//! view. Pair them with the ledger queries or a resolved
//! [`crate::period::DateRange`] to scope the input.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike as _, NaiveDate, Utc};

use crate::models::{
    BalanceSummary, CategoryId, CategoryStatistic, Expense, LedgerEntry, MonthlyStatistic,
    PeriodComparison,
};

/// Groups expenses by category, sums each group, and sorts the groups by
/// total, largest first.
///
/// Percentages are relative to the grand total of `expenses` (all zero if
/// that total is zero). Categories with equal totals keep the order in
/// which they first appear in `expenses`.
#[must_use]
pub fn category_breakdown(expenses: &[Expense]) -> Vec<CategoryStatistic> {
    let mut slots: HashMap<CategoryId, usize> = HashMap::new();
    let mut groups: Vec<CategoryStatistic> = Vec::new();

    for expense in expenses {
        if let Some(&slot) = slots.get(&expense.category.id) {
            if let Some(group) = groups.get_mut(slot) {
                group.total += expense.amount;
            }
        } else {
            let _previous = slots.insert(expense.category.id, groups.len());
            groups.push(CategoryStatistic {
                category: expense.category.clone(),
                total: expense.amount,
                percentage: 0.0,
            });
        }
    }

    let grand_total: f64 = groups.iter().map(|group| group.total).sum();
    if grand_total > 0.0 {
        for group in &mut groups {
            group.percentage = group.total / grand_total * 100.0;
        }
    }

    groups.sort_by(|a, b| b.total.total_cmp(&a.total));
    groups
}

/// Sums entries per calendar month (UTC), oldest month first.
#[must_use]
pub fn monthly_breakdown<E: LedgerEntry>(entries: &[E]) -> Vec<MonthlyStatistic> {
    let mut months: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for entry in entries {
        let date = entry.date();
        *months.entry((date.year(), date.month())).or_insert(0.0) += entry.amount();
    }

    months
        .into_iter()
        .filter_map(|((year, month), total)| {
            Some(MonthlyStatistic {
                month: month_start(year, month)?,
                total,
            })
        })
        .collect()
}

/// Sums the amounts of `entries`. Zero for an empty slice.
#[inline]
#[must_use]
pub fn total<E: LedgerEntry>(entries: &[E]) -> f64 {
    entries.iter().map(LedgerEntry::amount).sum()
}

/// Compares the totals of two selections, e.g. this week against the
/// week before. See [`compare_totals`] for how the change is computed.
#[inline]
#[must_use]
pub fn compare<E: LedgerEntry>(current: &[E], previous: &[E]) -> PeriodComparison {
    compare_totals(total(current), total(previous))
}

/// Compares two totals.
///
/// The percentage change is `(current - previous) / previous * 100` when
/// `previous` is positive and `0` otherwise, including when `previous` is
/// zero and `current` is not.
#[inline]
#[must_use]
pub fn compare_totals(current: f64, previous: f64) -> PeriodComparison {
    let percent_change = if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    };
    PeriodComparison {
        current,
        previous,
        percent_change,
    }
}

/// Sums incomes and expenses over the same selection.
#[inline]
#[must_use]
pub fn balance<I: LedgerEntry, X: LedgerEntry>(incomes: &[I], expenses: &[X]) -> BalanceSummary {
    let income_total = total(incomes);
    let expense_total = total(expenses);
    BalanceSummary {
        income_total,
        expense_total,
        balance: income_total - expense_total,
    }
}

/// First instant of the given month, in UTC.
fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

//! Expense and income records with their date-ordered queries.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{LedgerError, Result};
use crate::filter::EntryFilter;
use crate::models::{CategoryId, ExpenseId, ExpenseRecord, Income, IncomeId, LedgerEntry};

/// Holds every expense and income, each list sorted newest first.
///
/// Ordering is stable: entries sharing a timestamp keep their insertion
/// order. The store does not know about categories; checking that an
/// expense's category exists is done by [`crate::tracker::Tracker`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerStore {
    /// Expense records, date-descending.
    expenses: Vec<ExpenseRecord>,
    /// Incomes, date-descending.
    incomes: Vec<Income>,
}

impl LedgerStore {
    /// Creates an empty ledger.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from previously persisted records.
    ///
    /// Records with duplicate ids or invalid amounts are dropped with a
    /// warning. The rest are sorted.
    #[inline]
    #[must_use]
    pub fn from_records(expenses: Vec<ExpenseRecord>, incomes: Vec<Income>) -> Self {
        let mut expense_ids = HashSet::with_capacity(expenses.len());
        let expenses = expenses
            .into_iter()
            .filter(|record| {
                let keep = validate_amount(record.amount).is_ok() && expense_ids.insert(record.id);
                if !keep {
                    tracing::warn!(id = %record.id, "dropping invalid stored expense");
                }
                keep
            })
            .collect();

        let mut income_ids = HashSet::with_capacity(incomes.len());
        let incomes = incomes
            .into_iter()
            .filter(|income| {
                let keep =
                    validate_amount(income.amount).is_ok() && income_ids.insert(income.id.clone());
                if !keep {
                    tracing::warn!(id = %income.id, "dropping invalid stored income");
                }
                keep
            })
            .collect();

        let mut store = Self { expenses, incomes };
        store.sort_expenses();
        store.sort_incomes();
        store
    }

    // ── Expenses ────────────────────────────────────────────────────

    /// Returns all expense records, newest first.
    #[inline]
    #[must_use]
    pub fn expenses(&self) -> &[ExpenseRecord] {
        &self.expenses
    }

    /// Looks up an expense by id.
    #[inline]
    #[must_use]
    pub fn expense(&self, id: ExpenseId) -> Option<&ExpenseRecord> {
        self.expenses.iter().find(|record| record.id == id)
    }

    /// Inserts an expense and restores date order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] if the amount is not finite
    /// and strictly positive, or [`LedgerError::DuplicateId`] if the id is
    /// already present.
    #[inline]
    pub fn add_expense(&mut self, record: ExpenseRecord) -> Result<()> {
        validate_amount(record.amount)?;
        if self.expense(record.id).is_some() {
            return Err(LedgerError::DuplicateId(record.id.to_string()));
        }
        tracing::debug!(id = %record.id, amount = record.amount, "adding expense");
        self.expenses.push(record);
        self.sort_expenses();
        Ok(())
    }

    /// Removes an expense. Returns `false` if the id was unknown.
    #[inline]
    pub fn delete_expense(&mut self, id: ExpenseId) -> bool {
        let before = self.expenses.len();
        self.expenses.retain(|record| record.id != id);
        before != self.expenses.len()
    }

    /// Replaces the expense with this id, keeping the id.
    ///
    /// Returns `Ok(false)` and changes nothing if the id was unknown.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] if the replacement amount is
    /// invalid.
    #[inline]
    pub fn edit_expense(&mut self, id: ExpenseId, mut replacement: ExpenseRecord) -> Result<bool> {
        validate_amount(replacement.amount)?;
        let Some(slot) = self.expenses.iter_mut().find(|record| record.id == id) else {
            tracing::warn!(id = %id, "expense to edit not found");
            return Ok(false);
        };
        replacement.id = id;
        *slot = replacement;
        self.sort_expenses();
        Ok(true)
    }

    /// Removes every expense filed under `category_id` and returns how
    /// many were removed.
    #[inline]
    pub fn cascade_delete_by_category(&mut self, category_id: CategoryId) -> usize {
        self.retain_expenses(|record| record.category_id != category_id)
    }

    /// Keeps only the expenses for which `keep` returns `true` and
    /// returns how many were removed.
    pub(crate) fn retain_expenses<F: FnMut(&ExpenseRecord) -> bool>(&mut self, keep: F) -> usize {
        let before = self.expenses.len();
        self.expenses.retain(keep);
        before - self.expenses.len()
    }

    /// Returns the expenses matching `filter`, newest first.
    #[inline]
    #[must_use]
    pub fn filter_expenses(&self, filter: &EntryFilter) -> Vec<&ExpenseRecord> {
        self.expenses.iter().filter(|record| filter.matches(*record)).collect()
    }

    /// Returns the expenses dated on `day` (UTC).
    #[inline]
    #[must_use]
    pub fn expenses_on_day(&self, day: NaiveDate) -> Vec<&ExpenseRecord> {
        self.filter_expenses(&EntryFilter::new().on_day(day))
    }

    /// Returns the expenses dated in the given month (UTC).
    #[inline]
    #[must_use]
    pub fn expenses_in_month(&self, year: i32, month: u32) -> Vec<&ExpenseRecord> {
        self.filter_expenses(&EntryFilter::new().in_month(year, month))
    }

    /// Returns the expenses dated within `[start, end]`.
    #[inline]
    #[must_use]
    pub fn expenses_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&ExpenseRecord> {
        self.filter_expenses(&EntryFilter::new().date_range(start, end))
    }

    /// Returns the expenses of one category dated within `[start, end]`.
    #[inline]
    #[must_use]
    pub fn expenses_for_category_in_range(
        &self,
        category_id: CategoryId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<&ExpenseRecord> {
        self.filter_expenses(&EntryFilter::new().category(category_id).date_range(start, end))
    }

    /// Returns every expense of one category, newest first.
    #[inline]
    #[must_use]
    pub fn expenses_for_category(&self, category_id: CategoryId) -> Vec<&ExpenseRecord> {
        self.filter_expenses(&EntryFilter::new().category(category_id))
    }

    /// Returns `true` if no expense falls on `day` (UTC).
    #[inline]
    #[must_use]
    pub fn is_free_day(&self, day: NaiveDate) -> bool {
        !self
            .expenses
            .iter()
            .any(|record| record.date().date_naive() == day)
    }

    // ── Incomes ─────────────────────────────────────────────────────

    /// Returns all incomes, newest first.
    #[inline]
    #[must_use]
    pub fn incomes(&self) -> &[Income] {
        &self.incomes
    }

    /// Looks up an income by id.
    #[inline]
    #[must_use]
    pub fn income(&self, id: &IncomeId) -> Option<&Income> {
        self.incomes.iter().find(|income| income.id == *id)
    }

    /// Inserts an income and restores date order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] if the amount is not finite
    /// and strictly positive, or [`LedgerError::DuplicateId`] if the id is
    /// already present.
    #[inline]
    pub fn add_income(&mut self, income: Income) -> Result<()> {
        validate_amount(income.amount)?;
        if self.income(&income.id).is_some() {
            return Err(LedgerError::DuplicateId(income.id.to_string()));
        }
        tracing::debug!(id = %income.id, amount = income.amount, "adding income");
        self.incomes.push(income);
        self.sort_incomes();
        Ok(())
    }

    /// Removes an income. Returns `false` if the id was unknown.
    #[inline]
    pub fn delete_income(&mut self, id: &IncomeId) -> bool {
        let before = self.incomes.len();
        self.incomes.retain(|income| income.id != *id);
        before != self.incomes.len()
    }

    /// Replaces the income with this id, keeping the id.
    ///
    /// Returns `Ok(false)` and changes nothing if the id was unknown.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] if the replacement amount is
    /// invalid.
    #[inline]
    pub fn edit_income(&mut self, id: &IncomeId, mut replacement: Income) -> Result<bool> {
        validate_amount(replacement.amount)?;
        let Some(slot) = self.incomes.iter_mut().find(|income| income.id == *id) else {
            tracing::warn!(id = %id, "income to edit not found");
            return Ok(false);
        };
        replacement.id = id.clone();
        *slot = replacement;
        self.sort_incomes();
        Ok(true)
    }

    /// Returns the incomes matching `filter`, newest first.
    #[inline]
    #[must_use]
    pub fn filter_incomes(&self, filter: &EntryFilter) -> Vec<&Income> {
        self.incomes.iter().filter(|income| filter.matches(*income)).collect()
    }

    /// Returns the incomes dated on `day` (UTC).
    #[inline]
    #[must_use]
    pub fn incomes_on_day(&self, day: NaiveDate) -> Vec<&Income> {
        self.filter_incomes(&EntryFilter::new().on_day(day))
    }

    /// Returns the incomes dated in the given month (UTC).
    #[inline]
    #[must_use]
    pub fn incomes_in_month(&self, year: i32, month: u32) -> Vec<&Income> {
        self.filter_incomes(&EntryFilter::new().in_month(year, month))
    }

    /// Returns the incomes dated within `[start, end]`.
    #[inline]
    #[must_use]
    pub fn incomes_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&Income> {
        self.filter_incomes(&EntryFilter::new().date_range(start, end))
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Stable sort, newest first.
    fn sort_expenses(&mut self) {
        self.expenses.sort_by(|a, b| b.date.cmp(&a.date));
    }

    /// Stable sort, newest first.
    fn sort_incomes(&mut self) {
        self.incomes.sort_by(|a, b| b.date.cmp(&a.date));
    }
}

/// Accepts only finite, strictly positive amounts.
pub(crate) fn validate_amount(amount: f64) -> Result<()> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(amount))
    }
}

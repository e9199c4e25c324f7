//! Common view over dated, amount-bearing ledger entries.

use chrono::{DateTime, Utc};

use super::{CategoryId, Expense, ExpenseRecord, Income};

/// Read-only accessors shared by expenses and incomes.
///
/// Filtering and aggregation are written against this trait so that the
/// same code serves stored records, materialized expenses and incomes.
pub trait LedgerEntry {
    /// Entry amount.
    fn amount(&self) -> f64;

    /// Entry timestamp.
    fn date(&self) -> DateTime<Utc>;

    /// Optional free-text note.
    fn note(&self) -> Option<&str>;

    /// Category the entry is filed under, if the entry kind has one.
    #[inline]
    fn category_id(&self) -> Option<CategoryId> {
        None
    }
}

impl LedgerEntry for ExpenseRecord {
    #[inline]
    fn amount(&self) -> f64 {
        self.amount
    }

    #[inline]
    fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[inline]
    fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    #[inline]
    fn category_id(&self) -> Option<CategoryId> {
        Some(self.category_id)
    }
}

impl LedgerEntry for Expense {
    #[inline]
    fn amount(&self) -> f64 {
        self.amount
    }

    #[inline]
    fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[inline]
    fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    #[inline]
    fn category_id(&self) -> Option<CategoryId> {
        Some(self.category.id)
    }
}

impl LedgerEntry for Income {
    #[inline]
    fn amount(&self) -> f64 {
        self.amount
    }

    #[inline]
    fn date(&self) -> DateTime<Utc> {
        self.date
    }

    #[inline]
    fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }
}

impl<T: LedgerEntry + ?Sized> LedgerEntry for &T {
    #[inline]
    fn amount(&self) -> f64 {
        (**self).amount()
    }

    #[inline]
    fn date(&self) -> DateTime<Utc> {
        (**self).date()
    }

    #[inline]
    fn note(&self) -> Option<&str> {
        (**self).note()
    }

    #[inline]
    fn category_id(&self) -> Option<CategoryId> {
        (**self).category_id()
    }
}

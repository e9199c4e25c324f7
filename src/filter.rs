//! Composable filter for querying ledger entries.

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{CategoryId, LedgerEntry};

/// Composable filter for querying expenses and incomes.
///
/// Use builder-style methods to chain multiple criteria. All conditions
/// are combined: an entry must satisfy every set criterion to pass.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use expense_ledger::filter::EntryFilter;
/// use expense_ledger::models::CategoryId;
///
/// let filter = EntryFilter::new()
///     .date_range(
///         Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
///         Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap(),
///     )
///     .category(CategoryId::generate())
///     .note("lunch");
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EntryFilter {
    /// Start instant (inclusive).
    pub date_from: Option<DateTime<Utc>>,
    /// End instant (inclusive).
    pub date_to: Option<DateTime<Utc>>,
    /// Calendar day (UTC) the entry must fall on.
    pub day: Option<NaiveDate>,
    /// Calendar month (UTC) the entry must fall in, as `(year, month)`.
    pub month: Option<(i32, u32)>,
    /// Category ID. Entries without a category never match.
    pub category: Option<CategoryId>,
    /// Note substring (case-insensitive).
    pub note: Option<String>,
    /// Minimum amount (inclusive).
    pub min_amount: Option<f64>,
    /// Maximum amount (inclusive).
    pub max_amount: Option<f64>,
}

impl EntryFilter {
    /// Creates an empty filter that matches all entries.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to entries within `[from, to]`, both ends inclusive.
    ///
    /// An inverted range (`from > to`) matches nothing.
    #[inline]
    #[must_use]
    pub const fn date_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    /// Restricts to entries dated on the given UTC calendar day.
    #[inline]
    #[must_use]
    pub const fn on_day(mut self, day: NaiveDate) -> Self {
        self.day = Some(day);
        self
    }

    /// Restricts to entries dated in the given UTC calendar month.
    #[inline]
    #[must_use]
    pub const fn in_month(mut self, year: i32, month: u32) -> Self {
        self.month = Some((year, month));
        self
    }

    /// Restricts to entries filed under the given category.
    #[inline]
    #[must_use]
    pub const fn category(mut self, id: CategoryId) -> Self {
        self.category = Some(id);
        self
    }

    /// Restricts to entries whose note contains the given substring
    /// (case-insensitive).
    #[inline]
    #[must_use]
    pub fn note<T: Into<String>>(mut self, text: T) -> Self {
        self.note = Some(text.into());
        self
    }

    /// Restricts to entries with amounts in `[min, max]`.
    #[inline]
    #[must_use]
    pub const fn amount_range(mut self, min: f64, max: f64) -> Self {
        self.min_amount = Some(min);
        self.max_amount = Some(max);
        self
    }

    /// Returns `true` if the entry satisfies all set criteria.
    #[inline]
    #[must_use]
    pub fn matches<E: LedgerEntry>(&self, entry: &E) -> bool {
        self.matches_date(entry)
            && self.matches_calendar(entry)
            && self.matches_category(entry)
            && self.matches_note(entry)
            && self.matches_amount(entry)
    }

    /// Checks date range criteria.
    fn matches_date<E: LedgerEntry>(&self, entry: &E) -> bool {
        let date = entry.date();
        self.date_from.is_none_or(|from| date >= from) && self.date_to.is_none_or(|to| date <= to)
    }

    /// Checks day and month criteria.
    fn matches_calendar<E: LedgerEntry>(&self, entry: &E) -> bool {
        use chrono::Datelike as _;

        let day = entry.date().date_naive();
        self.day.is_none_or(|wanted| day == wanted)
            && self
                .month
                .is_none_or(|(year, month)| day.year() == year && day.month() == month)
    }

    /// Checks category criteria.
    fn matches_category<E: LedgerEntry>(&self, entry: &E) -> bool {
        self.category
            .is_none_or(|wanted| entry.category_id() == Some(wanted))
    }

    /// Checks note criteria.
    fn matches_note<E: LedgerEntry>(&self, entry: &E) -> bool {
        self.note.as_ref().is_none_or(|needle| {
            let needle_lower = needle.to_lowercase();
            entry
                .note()
                .is_some_and(|n| n.to_lowercase().contains(&needle_lower))
        })
    }

    /// Checks amount criteria.
    fn matches_amount<E: LedgerEntry>(&self, entry: &E) -> bool {
        let amount = entry.amount();
        self.min_amount.is_none_or(|min| amount >= min)
            && self.max_amount.is_none_or(|max| amount <= max)
    }
}

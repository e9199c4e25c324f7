//! The ledger state container.
//!
//! [`Tracker`] owns the category store and the ledger store, keeps them
//! consistent with each other, writes every change through to a
//! [`KeyValueStore`], and tells subscribers what changed.

use std::sync::mpsc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::backup::{BackupDocument, ImportReport};
use crate::categories::CategoryStore;
use crate::error::{LedgerError, Result};
use crate::filter::EntryFilter;
use crate::ledger::LedgerStore;
use crate::models::{
    BalanceSummary, Category, CategoryId, CategoryStatistic, Expense, ExpenseId, ExpenseRecord,
    Income, IncomeId, MonthlyStatistic, PeriodComparison,
};
use crate::period::{DateRange, Period};
use crate::statistics;
use crate::storage::{KeyValueStore, StorageKey};

/// Change notification sent to subscribers after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerEvent {
    /// Categories changed. Materialized expenses may show the change too,
    /// and a category delete also removes its expenses.
    CategoriesChanged,
    /// Expenses were added, edited or removed.
    ExpensesChanged,
    /// Incomes were added, edited or removed.
    IncomesChanged,
    /// The whole state was replaced by an import.
    Replaced,
}

/// Builder for constructing a [`Tracker`].
#[derive(Debug)]
pub struct TrackerBuilder<S: KeyValueStore> {
    /// Storage backend.
    storage: Option<S>,
    /// Whether to seed default categories on first run.
    seed_defaults: bool,
}

impl<S: KeyValueStore> TrackerBuilder<S> {
    /// Sets the storage backend.
    #[inline]
    #[must_use]
    pub fn storage(mut self, storage: S) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Controls whether the default categories are seeded when storage
    /// holds no categories yet. Enabled by default.
    #[inline]
    #[must_use]
    pub const fn seed_defaults(mut self, seed: bool) -> Self {
        self.seed_defaults = seed;
        self
    }

    /// Loads persisted state and builds the tracker.
    ///
    /// Expenses whose category no longer exists are dropped and the
    /// pruned list is written back.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if no storage was provided or the
    /// backend fails, and [`LedgerError::Serialization`] if a persisted
    /// payload cannot be decoded.
    #[tracing::instrument(skip_all)]
    pub fn build(self) -> Result<Tracker<S>> {
        let storage = self
            .storage
            .ok_or_else(|| LedgerError::Storage("storage backend is required".into()))?;

        let (categories, seeded) = match storage.load(StorageKey::Categories)? {
            Some(bytes) => {
                let stored: Vec<Category> = serde_json::from_slice(&bytes)?;
                (CategoryStore::from_categories(stored), false)
            }
            None if self.seed_defaults => (CategoryStore::with_defaults(), true),
            None => (CategoryStore::new(), false),
        };
        let expenses: Vec<ExpenseRecord> = load_list(&storage, StorageKey::Expenses)?;
        let incomes: Vec<Income> = load_list(&storage, StorageKey::Incomes)?;
        let mut ledger = LedgerStore::from_records(expenses, incomes);

        let orphans = ledger.retain_expenses(|record| categories.contains(record.category_id));
        if orphans > 0 {
            tracing::warn!(count = orphans, "pruned expenses with missing categories");
        }

        let tracker = Tracker {
            storage,
            categories,
            ledger,
            subscribers: Vec::new(),
        };
        if seeded {
            tracing::debug!(count = tracker.categories.len(), "seeding default categories");
            tracker.persist(StorageKey::Categories)?;
        }
        if orphans > 0 {
            tracker.persist(StorageKey::Expenses)?;
        }
        tracing::debug!(
            categories = tracker.categories.len(),
            expenses = tracker.ledger.expenses().len(),
            incomes = tracker.ledger.incomes().len(),
            "ledger loaded"
        );
        Ok(tracker)
    }
}

/// Decodes a JSON array stored under `key`, or an empty list if absent.
fn load_list<S, T>(storage: &S, key: StorageKey) -> Result<Vec<T>>
where
    S: KeyValueStore,
    T: serde::de::DeserializeOwned,
{
    match storage.load(key)? {
        Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
        None => Ok(Vec::new()),
    }
}

/// Categories, expenses and incomes, persisted through `S`.
///
/// Every mutation updates memory first, notifies subscribers, then
/// writes the affected keys. A failed write is returned as an error but
/// the in-memory change stays in place.
///
/// Use [`Tracker::builder()`] to construct an instance.
#[derive(Debug)]
pub struct Tracker<S: KeyValueStore> {
    /// Storage backend.
    storage: S,
    /// Categories in display order.
    categories: CategoryStore,
    /// Expense and income records.
    ledger: LedgerStore,
    /// Live subscriptions. Disconnected ones are dropped on the next send.
    subscribers: Vec<mpsc::Sender<LedgerEvent>>,
}

impl<S: KeyValueStore> Tracker<S> {
    /// Creates a new builder for configuring the tracker.
    #[inline]
    #[must_use]
    pub const fn builder() -> TrackerBuilder<S> {
        TrackerBuilder {
            storage: None,
            seed_defaults: true,
        }
    }

    /// Returns the storage backend.
    #[inline]
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Registers a subscriber. Every later mutation sends one event.
    #[inline]
    pub fn subscribe(&mut self) -> mpsc::Receiver<LedgerEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        receiver
    }

    // ── Categories ──────────────────────────────────────────────────

    /// Returns all categories in display order.
    #[inline]
    #[must_use]
    pub fn categories(&self) -> &[Category] {
        self.categories.list()
    }

    /// Returns the category store.
    #[inline]
    #[must_use]
    pub const fn category_store(&self) -> &CategoryStore {
        &self.categories
    }

    /// Looks up a category by id.
    #[inline]
    #[must_use]
    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(id)
    }

    /// Appends a category.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateId`] if the id exists, or a storage
    /// error if the write fails.
    #[inline]
    pub fn add_category(&mut self, category: Category) -> Result<()> {
        self.categories.add(category)?;
        self.commit(LedgerEvent::CategoriesChanged, &[StorageKey::Categories])
    }

    /// Deletes a category together with every expense filed under it.
    ///
    /// Returns `Ok(false)` if the category did not exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    #[inline]
    pub fn delete_category(&mut self, id: CategoryId) -> Result<bool> {
        if !self.categories.delete(id) {
            return Ok(false);
        }
        let removed = self.ledger.cascade_delete_by_category(id);
        tracing::debug!(id = %id, expenses_removed = removed, "deleted category");
        self.commit(
            LedgerEvent::CategoriesChanged,
            &[StorageKey::Categories, StorageKey::Expenses],
        )?;
        Ok(true)
    }

    /// Replaces a category's name, color and icon.
    ///
    /// Expenses reference categories by id, so they show the new values
    /// immediately. Returns `Ok(false)` if the category did not exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    #[inline]
    pub fn edit_category(&mut self, id: CategoryId, replacement: Category) -> Result<bool> {
        if !self.categories.edit(id, replacement) {
            return Ok(false);
        }
        self.commit(LedgerEvent::CategoriesChanged, &[StorageKey::Categories])?;
        Ok(true)
    }

    /// Reorders categories.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidReorder`] if `order` is not a
    /// permutation of the current ids, or a storage error if the write
    /// fails.
    #[inline]
    pub fn reorder_categories(&mut self, order: &[CategoryId]) -> Result<()> {
        self.categories.reorder(order)?;
        self.commit(LedgerEvent::CategoriesChanged, &[StorageKey::Categories])
    }

    /// Sorts categories alphabetically.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    #[inline]
    pub fn sort_categories_by_name(&mut self) -> Result<()> {
        self.categories.sort_by_name();
        self.commit(LedgerEvent::CategoriesChanged, &[StorageKey::Categories])
    }

    // ── Expenses ────────────────────────────────────────────────────

    /// Returns the ledger store with raw records.
    #[inline]
    #[must_use]
    pub const fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    /// Returns every expense with its category attached, newest first.
    #[inline]
    #[must_use]
    pub fn expenses(&self) -> Vec<Expense> {
        self.materialize(self.ledger.expenses())
    }

    /// Looks up an expense by id.
    #[inline]
    #[must_use]
    pub fn expense(&self, id: ExpenseId) -> Option<Expense> {
        let record = self.ledger.expense(id)?;
        let category = self.categories.get(record.category_id)?;
        Some(record.materialize(category))
    }

    /// Records an expense.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownCategory`] if the category does not
    /// exist, [`LedgerError::InvalidAmount`] or
    /// [`LedgerError::DuplicateId`] if the record is rejected, or a
    /// storage error if the write fails.
    #[inline]
    pub fn add_expense(&mut self, record: ExpenseRecord) -> Result<()> {
        self.ensure_category(record.category_id)?;
        self.ledger.add_expense(record)?;
        self.commit(LedgerEvent::ExpensesChanged, &[StorageKey::Expenses])
    }

    /// Deletes an expense. Returns `Ok(false)` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    #[inline]
    pub fn delete_expense(&mut self, id: ExpenseId) -> Result<bool> {
        if !self.ledger.delete_expense(id) {
            return Ok(false);
        }
        self.commit(LedgerEvent::ExpensesChanged, &[StorageKey::Expenses])?;
        Ok(true)
    }

    /// Replaces an expense, keeping its id. Returns `Ok(false)` if it did
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownCategory`] or
    /// [`LedgerError::InvalidAmount`] if the replacement is rejected, or
    /// a storage error if the write fails.
    #[inline]
    pub fn edit_expense(&mut self, id: ExpenseId, replacement: ExpenseRecord) -> Result<bool> {
        if self.ledger.expense(id).is_none() {
            tracing::warn!(id = %id, "expense to edit not found");
            return Ok(false);
        }
        self.ensure_category(replacement.category_id)?;
        if !self.ledger.edit_expense(id, replacement)? {
            return Ok(false);
        }
        self.commit(LedgerEvent::ExpensesChanged, &[StorageKey::Expenses])?;
        Ok(true)
    }

    /// Returns the expenses matching `filter`, newest first.
    #[inline]
    #[must_use]
    pub fn filter_expenses(&self, filter: &EntryFilter) -> Vec<Expense> {
        self.materialize(self.ledger.filter_expenses(filter))
    }

    /// Returns the expenses dated on `day` (UTC).
    #[inline]
    #[must_use]
    pub fn expenses_on_day(&self, day: NaiveDate) -> Vec<Expense> {
        self.materialize(self.ledger.expenses_on_day(day))
    }

    /// Returns the expenses dated in the given month (UTC).
    #[inline]
    #[must_use]
    pub fn expenses_in_month(&self, year: i32, month: u32) -> Vec<Expense> {
        self.materialize(self.ledger.expenses_in_month(year, month))
    }

    /// Returns the expenses dated within `range`.
    #[inline]
    #[must_use]
    pub fn expenses_in_range(&self, range: DateRange) -> Vec<Expense> {
        self.materialize(self.ledger.expenses_in_range(range.start, range.end))
    }

    /// Returns the expenses of one category dated within `range`.
    #[inline]
    #[must_use]
    pub fn expenses_for_category_in_range(
        &self,
        category_id: CategoryId,
        range: DateRange,
    ) -> Vec<Expense> {
        self.materialize(
            self.ledger
                .expenses_for_category_in_range(category_id, range.start, range.end),
        )
    }

    /// Returns every expense of one category, newest first.
    #[inline]
    #[must_use]
    pub fn expenses_for_category(&self, category_id: CategoryId) -> Vec<Expense> {
        self.materialize(self.ledger.expenses_for_category(category_id))
    }

    /// Returns `true` if nothing was spent on `day` (UTC).
    #[inline]
    #[must_use]
    pub fn is_free_day(&self, day: NaiveDate) -> bool {
        self.ledger.is_free_day(day)
    }

    // ── Incomes ─────────────────────────────────────────────────────

    /// Returns every income, newest first.
    #[inline]
    #[must_use]
    pub fn incomes(&self) -> &[Income] {
        self.ledger.incomes()
    }

    /// Records an income.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] or
    /// [`LedgerError::DuplicateId`] if the income is rejected, or a
    /// storage error if the write fails.
    #[inline]
    pub fn add_income(&mut self, income: Income) -> Result<()> {
        self.ledger.add_income(income)?;
        self.commit(LedgerEvent::IncomesChanged, &[StorageKey::Incomes])
    }

    /// Deletes an income. Returns `Ok(false)` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails.
    #[inline]
    pub fn delete_income(&mut self, id: &IncomeId) -> Result<bool> {
        if !self.ledger.delete_income(id) {
            return Ok(false);
        }
        self.commit(LedgerEvent::IncomesChanged, &[StorageKey::Incomes])?;
        Ok(true)
    }

    /// Replaces an income, keeping its id. Returns `Ok(false)` if it did
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidAmount`] if the replacement is
    /// rejected, or a storage error if the write fails.
    #[inline]
    pub fn edit_income(&mut self, id: &IncomeId, replacement: Income) -> Result<bool> {
        if !self.ledger.edit_income(id, replacement)? {
            return Ok(false);
        }
        self.commit(LedgerEvent::IncomesChanged, &[StorageKey::Incomes])?;
        Ok(true)
    }

    // ── Statistics ──────────────────────────────────────────────────

    /// Spending per category within `range`, largest first.
    #[inline]
    #[must_use]
    pub fn category_breakdown(&self, range: DateRange) -> Vec<CategoryStatistic> {
        statistics::category_breakdown(&self.expenses_in_range(range))
    }

    /// Spending per calendar month within `range`, oldest first.
    #[inline]
    #[must_use]
    pub fn monthly_expenses(&self, range: DateRange) -> Vec<MonthlyStatistic> {
        statistics::monthly_breakdown(&self.ledger.expenses_in_range(range.start, range.end))
    }

    /// Income per calendar month within `range`, oldest first.
    #[inline]
    #[must_use]
    pub fn monthly_incomes(&self, range: DateRange) -> Vec<MonthlyStatistic> {
        statistics::monthly_breakdown(&self.ledger.incomes_in_range(range.start, range.end))
    }

    /// Income against spending within `range`.
    #[inline]
    #[must_use]
    pub fn balance(&self, range: DateRange) -> BalanceSummary {
        statistics::balance(
            &self.ledger.incomes_in_range(range.start, range.end),
            &self.ledger.expenses_in_range(range.start, range.end),
        )
    }

    /// Compares spending in `period` against the window of the same
    /// length just before it.
    #[inline]
    #[must_use]
    pub fn compare_with_previous(&self, period: Period) -> PeriodComparison {
        self.compare_with_previous_at(period, Utc::now())
    }

    /// Like [`Self::compare_with_previous`], resolving `period` at `now`.
    #[inline]
    #[must_use]
    pub fn compare_with_previous_at(&self, period: Period, now: DateTime<Utc>) -> PeriodComparison {
        let current = period.resolve_at(now);
        let previous = current.preceding();
        statistics::compare(
            &self.ledger.expenses_in_range(current.start, current.end),
            &self.ledger.expenses_in_range(previous.start, previous.end),
        )
    }

    // ── Backup ──────────────────────────────────────────────────────

    /// Snapshots the whole ledger as a backup document stamped `now`.
    #[inline]
    #[must_use]
    pub fn export_backup_at(&self, now: DateTime<Utc>) -> BackupDocument {
        BackupDocument::from_snapshot(
            self.categories.list(),
            self.ledger.expenses(),
            self.ledger.incomes(),
            now,
        )
    }

    /// Snapshots the whole ledger as a backup document.
    #[inline]
    #[must_use]
    pub fn export_backup(&self) -> BackupDocument {
        self.export_backup_at(Utc::now())
    }

    /// Snapshots the whole ledger as pretty-printed backup JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Serialization`] if encoding fails.
    #[tracing::instrument(skip_all)]
    pub fn export_backup_json(&self) -> Result<String> {
        let json = self.export_backup().to_json_pretty()?;
        tracing::debug!(bytes = json.len(), "exported backup");
        Ok(json)
    }

    /// Replaces the whole ledger with the contents of a backup.
    ///
    /// Structural problems reject the import and leave the ledger
    /// untouched. Individual bad records are skipped and listed in the
    /// returned report.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidBackup`] for a structurally invalid
    /// document, or a storage error if writing the new state fails (the
    /// new state is kept in memory).
    #[tracing::instrument(skip_all)]
    pub fn import_backup(&mut self, bytes: &[u8]) -> Result<ImportReport> {
        let document = BackupDocument::from_slice(bytes)?;
        let (restored, report) = document.restore();
        self.categories = restored.categories;
        self.ledger = restored.ledger;
        tracing::debug!(
            categories = report.categories_imported,
            expenses = report.expenses_imported,
            incomes = report.incomes_imported,
            skipped = report.skipped.len(),
            "imported backup"
        );
        self.commit(LedgerEvent::Replaced, &StorageKey::ALL)?;
        Ok(report)
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Fails with [`LedgerError::UnknownCategory`] unless `id` exists.
    fn ensure_category(&self, id: CategoryId) -> Result<()> {
        if self.categories.contains(id) {
            Ok(())
        } else {
            Err(LedgerError::UnknownCategory(id))
        }
    }

    /// Attaches live categories to records.
    fn materialize<'a, I>(&self, records: I) -> Vec<Expense>
    where
        I: IntoIterator<Item = &'a ExpenseRecord>,
    {
        records
            .into_iter()
            .filter_map(|record| {
                self.categories
                    .get(record.category_id)
                    .map(|category| record.materialize(category))
            })
            .collect()
    }

    /// Notifies subscribers, then writes every key in `keys`.
    ///
    /// All keys are attempted; the first failure is returned.
    fn commit(&mut self, event: LedgerEvent, keys: &[StorageKey]) -> Result<()> {
        self.subscribers.retain(|sender| sender.send(event).is_ok());
        let mut first_error = None;
        for &key in keys {
            if let Err(err) = self.persist(key) {
                tracing::warn!(key = %key, error = %err, "failed to persist ledger state");
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Encodes and saves the payload for `key`.
    fn persist(&self, key: StorageKey) -> Result<()> {
        let bytes = match key {
            StorageKey::Categories => serde_json::to_vec(self.categories.list())?,
            StorageKey::Expenses => serde_json::to_vec(self.ledger.expenses())?,
            StorageKey::Incomes => serde_json::to_vec(self.ledger.incomes())?,
        };
        tracing::debug!(key = %key, bytes = bytes.len(), "saving");
        self.storage.save(key, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;
    use crate::storage::InMemoryStorage;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn tracker() -> Tracker<InMemoryStorage> {
        Tracker::builder()
            .storage(InMemoryStorage::new())
            .build()
            .unwrap()
    }

    fn food<S: KeyValueStore>(tracker: &Tracker<S>) -> CategoryId {
        tracker.category_store().find_by_name("Food").unwrap().id
    }

    fn stored<T: serde::de::DeserializeOwned>(
        tracker: &Tracker<InMemoryStorage>,
        key: StorageKey,
    ) -> Vec<T> {
        let bytes = tracker.storage().load(key).unwrap().unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn builder_requires_storage() {
        let result = Tracker::<InMemoryStorage>::builder().build();
        assert!(matches!(result, Err(LedgerError::Storage(_))));
    }

    #[test]
    fn first_open_seeds_and_persists_defaults() {
        let tracker = tracker();
        assert_eq!(tracker.categories().len(), 7);
        let persisted: Vec<Category> = stored(&tracker, StorageKey::Categories);
        assert_eq!(persisted, tracker.categories());
    }

    #[test]
    fn seeding_can_be_disabled() {
        let tracker = Tracker::builder()
            .storage(InMemoryStorage::new())
            .seed_defaults(false)
            .build()
            .unwrap();
        assert!(tracker.categories().is_empty());
        assert!(tracker.storage().load(StorageKey::Categories).unwrap().is_none());
    }

    #[test]
    fn reopen_keeps_state() {
        let storage = std::sync::Arc::new(InMemoryStorage::new());
        let mut first = Tracker::builder()
            .storage(std::sync::Arc::clone(&storage))
            .build()
            .unwrap();
        let category = food(&first);
        first
            .add_expense(ExpenseRecord::new(12.0, category, at(2024, 1, 2), None))
            .unwrap();
        first.add_income(Income::new(99.0, at(2024, 1, 3), None)).unwrap();
        let categories = first.categories().to_vec();
        drop(first);

        let second = Tracker::builder().storage(storage).build().unwrap();
        assert_eq!(second.categories(), categories);
        assert_eq!(second.expenses().len(), 1);
        assert_eq!(second.incomes().len(), 1);
    }

    #[test]
    fn corrupt_payload_fails_open() {
        let storage = InMemoryStorage::new().with_entry(StorageKey::Expenses, b"{not json".to_vec());
        let result = Tracker::builder().storage(storage).build();
        assert!(matches!(result, Err(LedgerError::Serialization(_))));
    }

    #[test]
    fn orphan_expenses_are_pruned_on_open() {
        let category = Category::new("Rent", "#000000", "r");
        let kept = ExpenseRecord::new(10.0, category.id, at(2024, 1, 1), None);
        let orphan = ExpenseRecord::new(20.0, CategoryId::generate(), at(2024, 1, 2), None);
        let storage = InMemoryStorage::new()
            .with_entry(StorageKey::Categories, serde_json::to_vec(&[&category]).unwrap())
            .with_entry(StorageKey::Expenses, serde_json::to_vec(&[&kept, &orphan]).unwrap());

        let tracker = Tracker::builder().storage(storage).build().unwrap();
        assert_eq!(tracker.ledger().expenses(), [kept.clone()]);
        let persisted: Vec<ExpenseRecord> = stored(&tracker, StorageKey::Expenses);
        assert_eq!(persisted, [kept]);
    }

    #[test]
    fn add_expense_requires_known_category() {
        let mut tracker = tracker();
        let missing = CategoryId::generate();
        let err = tracker
            .add_expense(ExpenseRecord::new(5.0, missing, at(2024, 1, 1), None))
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownCategory(id) if id == missing));
        assert!(tracker.expenses().is_empty());
    }

    #[test]
    fn delete_category_cascades() {
        let mut tracker = tracker();
        let food = food(&tracker);
        let transport = tracker.category_store().find_by_name("Transport").unwrap().id;
        tracker
            .add_expense(ExpenseRecord::new(5.0, food, at(2024, 1, 1), None))
            .unwrap();
        tracker
            .add_expense(ExpenseRecord::new(7.0, transport, at(2024, 1, 2), None))
            .unwrap();

        assert!(tracker.delete_category(food).unwrap());
        assert!(tracker.expenses().iter().all(|e| e.category.id != food));
        assert_eq!(tracker.expenses().len(), 1);

        let persisted: Vec<ExpenseRecord> = stored(&tracker, StorageKey::Expenses);
        assert_eq!(persisted.len(), 1);
        assert!(!tracker.delete_category(food).unwrap());
    }

    #[test]
    fn edit_category_shows_in_expenses() {
        let mut tracker = tracker();
        let food = food(&tracker);
        tracker
            .add_expense(ExpenseRecord::new(5.0, food, at(2024, 1, 1), None))
            .unwrap();
        tracker
            .add_expense(ExpenseRecord::new(6.0, food, at(2024, 1, 2), None))
            .unwrap();

        let replacement = Category::new("Groceries", "#00FF00", "g");
        assert!(tracker.edit_category(food, replacement).unwrap());

        let edited = tracker.category(food).unwrap().clone();
        assert_eq!(edited.name, "Groceries");
        assert!(tracker.expenses().iter().all(|e| e.category == edited));
    }

    #[test]
    fn edits_of_unknown_ids_change_nothing() {
        let mut tracker = tracker();
        let events = tracker.subscribe();
        let food = food(&tracker);
        assert!(!tracker
            .edit_expense(ExpenseId::generate(), ExpenseRecord::new(1.0, food, at(2024, 1, 1), None))
            .unwrap());
        assert!(!tracker
            .edit_income(&IncomeId::generate(), Income::new(1.0, at(2024, 1, 1), None))
            .unwrap());
        assert!(!tracker.delete_expense(ExpenseId::generate()).unwrap());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn edit_of_unknown_expense_ignores_its_category() {
        let mut tracker = tracker();
        let missing = CategoryId::generate();
        let replacement = ExpenseRecord::new(1.0, missing, at(2024, 1, 1), None);
        assert!(!tracker.edit_expense(ExpenseId::generate(), replacement.clone()).unwrap());

        let existing = ExpenseRecord::new(2.0, food(&tracker), at(2024, 1, 2), None);
        let id = existing.id;
        tracker.add_expense(existing).unwrap();
        let err = tracker.edit_expense(id, replacement).unwrap_err();
        assert!(matches!(err, LedgerError::UnknownCategory(category) if category == missing));
    }

    #[test]
    fn subscribers_receive_one_event_per_mutation() {
        let mut tracker = tracker();
        let events = tracker.subscribe();
        let food = food(&tracker);
        let record = ExpenseRecord::new(5.0, food, at(2024, 1, 1), None);
        let id = record.id;

        tracker.add_expense(record).unwrap();
        tracker.add_income(Income::new(5.0, at(2024, 1, 1), None)).unwrap();
        assert!(tracker.delete_expense(id).unwrap());
        assert!(tracker.delete_category(food).unwrap());

        let received: Vec<LedgerEvent> = events.try_iter().collect();
        assert_eq!(
            received,
            [
                LedgerEvent::ExpensesChanged,
                LedgerEvent::IncomesChanged,
                LedgerEvent::ExpensesChanged,
                LedgerEvent::CategoriesChanged,
            ]
        );
    }

    #[test]
    fn dropped_subscribers_are_forgotten() {
        let mut tracker = tracker();
        drop(tracker.subscribe());
        tracker.sort_categories_by_name().unwrap();
        assert!(tracker.subscribers.is_empty());
    }

    #[test]
    fn failed_write_is_reported_and_change_kept() {
        let category = Category::new("Rent", "#000000", "r");
        let storage = InMemoryStorage::failing_writes()
            .with_entry(StorageKey::Categories, serde_json::to_vec(&[&category]).unwrap());
        let mut tracker = Tracker::builder().storage(storage).build().unwrap();

        let err = tracker
            .add_expense(ExpenseRecord::new(500.0, category.id, at(2024, 1, 1), None))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Storage(_)));
        assert_eq!(tracker.expenses().len(), 1);
    }

    #[test]
    fn compare_with_previous_week() {
        let mut tracker = tracker();
        let food = food(&tracker);
        let now = at(2024, 5, 15);
        tracker
            .add_expense(ExpenseRecord::new(30.0, food, at(2024, 5, 14), None))
            .unwrap();
        tracker
            .add_expense(ExpenseRecord::new(20.0, food, at(2024, 5, 5), None))
            .unwrap();

        let comparison = tracker.compare_with_previous_at(Period::ThisWeek, now);
        assert!((comparison.current - 30.0).abs() < 1e-9);
        assert!((comparison.previous - 20.0).abs() < 1e-9);
        assert!((comparison.percent_change - 50.0).abs() < 1e-9);
    }

    #[test]
    fn range_statistics() {
        let mut tracker = tracker();
        let food = food(&tracker);
        tracker
            .add_expense(ExpenseRecord::new(80.0, food, at(2024, 3, 1), None))
            .unwrap();
        tracker.add_income(Income::new(50.0, at(2024, 3, 1), None)).unwrap();
        tracker.add_income(Income::new(150.0, at(2024, 4, 1), None)).unwrap();

        let range = DateRange::new(at(2024, 1, 1), at(2024, 12, 31));
        let breakdown = tracker.category_breakdown(range);
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[0].category.name, "Food");

        assert_eq!(tracker.monthly_incomes(range).len(), 2);
        assert_eq!(tracker.monthly_expenses(range).len(), 1);

        let summary = tracker.balance(range);
        assert!((summary.balance - 120.0).abs() < 1e-9);
    }

    #[test]
    fn import_replaces_state_and_emits_replaced() {
        let mut source = tracker();
        let food = food(&source);
        source
            .add_expense(ExpenseRecord::new(100.0, food, at(2024, 5, 1), None))
            .unwrap();
        let json = source.export_backup_json().unwrap();

        let mut target = tracker();
        target.add_income(Income::new(1.0, at(2024, 1, 1), None)).unwrap();
        let events = target.subscribe();
        let report = target.import_backup(json.as_bytes()).unwrap();

        assert!(report.is_complete());
        assert_eq!(target.categories(), source.categories());
        assert_eq!(target.expenses(), source.expenses());
        assert!(target.incomes().is_empty());
        assert_eq!(events.try_iter().collect::<Vec<_>>(), [LedgerEvent::Replaced]);

        let persisted: Vec<Income> = stored(&target, StorageKey::Incomes);
        assert!(persisted.is_empty());
    }

    #[test]
    fn invalid_import_leaves_state_untouched() {
        let mut tracker = tracker();
        let food = food(&tracker);
        tracker
            .add_expense(ExpenseRecord::new(100.0, food, at(2024, 5, 1), None))
            .unwrap();
        let before = tracker.expenses();

        let err = tracker.import_backup(b"{\"version\": \"1.0\"").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidBackup { .. }));
        assert_eq!(tracker.expenses(), before);
        assert_eq!(tracker.categories().len(), 7);
    }
}

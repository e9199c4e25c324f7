//! Async facade over a [`Tracker`] shared between tasks.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::backup::ImportReport;
use crate::error::Result;
use crate::storage::KeyValueStore;
use crate::tracker::Tracker;

/// A [`Tracker`] behind an async mutex, cheap to clone across tasks.
///
/// Every operation holds the lock for its whole duration, so backup
/// export and import never interleave with each other or with a
/// mutation. Export and import run on tokio's blocking pool because they
/// encode and write the full ledger.
///
/// # Example
///
/// ```rust
/// use expense_ledger::shared::SharedTracker;
/// use expense_ledger::storage::InMemoryStorage;
/// use expense_ledger::tracker::Tracker;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> expense_ledger::error::Result<()> {
/// let tracker = Tracker::builder().storage(InMemoryStorage::new()).build()?;
/// let shared = SharedTracker::new(tracker);
/// let json = shared.export_backup().await?;
/// let report = shared.import_backup(json.into_bytes()).await?;
/// assert!(report.is_complete());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SharedTracker<S: KeyValueStore> {
    /// The tracker and its lock.
    inner: Arc<Mutex<Tracker<S>>>,
}

impl<S: KeyValueStore> Clone for SharedTracker<S> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeyValueStore + 'static> SharedTracker<S> {
    /// Wraps a tracker for shared use.
    #[inline]
    #[must_use]
    pub fn new(tracker: Tracker<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    /// Runs `op` with exclusive access to the tracker.
    #[inline]
    pub async fn with<R, F>(&self, op: F) -> R
    where
        F: FnOnce(&mut Tracker<S>) -> R,
    {
        let mut tracker = self.inner.lock().await;
        op(&mut tracker)
    }

    /// Encodes the whole ledger as backup JSON on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::LedgerError::Serialization`] if encoding
    /// fails, or [`crate::error::LedgerError::Task`] if the background
    /// task panicked.
    #[tracing::instrument(skip_all)]
    pub async fn export_backup(&self) -> Result<String> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.blocking_lock().export_backup_json()).await?
    }

    /// Replaces the whole ledger from backup bytes on the blocking pool.
    ///
    /// # Errors
    ///
    /// Same as [`Tracker::import_backup`], plus
    /// [`crate::error::LedgerError::Task`] if the background task
    /// panicked.
    #[tracing::instrument(skip_all)]
    pub async fn import_backup(&self, bytes: Vec<u8>) -> Result<ImportReport> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.blocking_lock().import_backup(&bytes)).await?
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};

    use super::*;
    use crate::error::LedgerError;
    use crate::models::ExpenseRecord;
    use crate::storage::InMemoryStorage;

    fn shared() -> SharedTracker<InMemoryStorage> {
        SharedTracker::new(
            Tracker::builder()
                .storage(InMemoryStorage::new())
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn with_mutates_shared_state() {
        let shared = shared();
        let other = shared.clone();
        let food = shared.with(|t| t.categories()[0].id).await;
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        other
            .with(|t| t.add_expense(ExpenseRecord::new(10.0, food, date, None)))
            .await
            .unwrap();
        assert_eq!(shared.with(|t| t.expenses().len()).await, 1);
    }

    #[tokio::test]
    async fn export_then_import_roundtrips() {
        let source = shared();
        let food = source.with(|t| t.categories()[0].id).await;
        let date = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        source
            .with(|t| t.add_expense(ExpenseRecord::new(100.0, food, date, None)))
            .await
            .unwrap();

        let json = source.export_backup().await.unwrap();
        let target = shared();
        let report = target.import_backup(json.into_bytes()).await.unwrap();

        assert_eq!(report.expenses_imported, 1);
        let expected = source.with(|t| t.expenses()).await;
        assert_eq!(target.with(|t| t.expenses()).await, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_imports_are_serialized() {
        let source = shared();
        let json = source.export_backup().await.unwrap();
        let target = shared();

        let first = tokio::spawn({
            let target = target.clone();
            let bytes = json.clone().into_bytes();
            async move { target.import_backup(bytes).await }
        });
        let second = tokio::spawn({
            let target = target.clone();
            let bytes = json.into_bytes();
            async move { target.import_backup(bytes).await }
        });
        let first_report = first.await.unwrap().unwrap();
        let second_report = second.await.unwrap().unwrap();
        assert!(first_report.is_complete() && second_report.is_complete());

        let categories = target.with(|t| t.categories().to_vec()).await;
        let expected = source.with(|t| t.categories().to_vec()).await;
        assert_eq!(categories, expected);
    }

    #[tokio::test]
    async fn invalid_import_is_reported() {
        let shared = shared();
        let err = shared.import_backup(b"[]".to_vec()).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidBackup { .. }));
    }
}

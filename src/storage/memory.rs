//! In-memory storage backend for testing.
//!
//! Provides [`InMemoryStorage`], a thread-safe in-memory implementation of
//! [`KeyValueStore`]. Ideal for unit and integration tests where file I/O
//! is undesirable.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{KeyValueStore, StorageKey};
use crate::error::{Result, lock_poison_error};

/// Thread-safe in-memory storage for testing.
///
/// # Example
///
/// ```rust
/// use expense_ledger::storage::InMemoryStorage;
/// use expense_ledger::tracker::Tracker;
///
/// let tracker = Tracker::builder()
///     .storage(InMemoryStorage::new())
///     .build()
///     .unwrap();
/// assert_eq!(tracker.categories().len(), 7);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    /// Saved payloads behind a single mutex for thread-safe interior
    /// mutability.
    inner: Mutex<HashMap<StorageKey, Vec<u8>>>,
    /// When set, every `save` fails. Lets tests exercise write errors.
    fail_writes: bool,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage whose writes always fail with
    /// [`crate::error::LedgerError::Storage`].
    #[inline]
    #[must_use]
    pub fn failing_writes() -> Self {
        Self {
            inner: Mutex::default(),
            fail_writes: true,
        }
    }

    /// Creates a storage pre-populated with `key` → `bytes`.
    #[inline]
    #[must_use]
    pub fn with_entry(self, key: StorageKey, bytes: Vec<u8>) -> Self {
        let mut inner = self
            .inner
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let _old = inner.insert(key, bytes);
        Self {
            inner: Mutex::new(inner),
            fail_writes: self.fail_writes,
        }
    }

    /// Acquires the inner lock and applies a closure.
    fn with_lock<R>(&self, f: impl FnOnce(&mut HashMap<StorageKey, Vec<u8>>) -> R) -> Result<R> {
        let mut inner = self.inner.lock().map_err(|err| lock_poison_error(&err))?;
        Ok(f(&mut inner))
    }
}

impl KeyValueStore for InMemoryStorage {
    #[inline]
    fn load(&self, key: StorageKey) -> Result<Option<Vec<u8>>> {
        self.with_lock(|inner| inner.get(&key).cloned())
    }

    #[inline]
    fn save(&self, key: StorageKey, bytes: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(crate::error::LedgerError::Storage(
                format!("write to `{key}` rejected").into(),
            ));
        }
        self.with_lock(|inner| {
            let _old = inner.insert(key, bytes.to_vec());
        })
    }
}

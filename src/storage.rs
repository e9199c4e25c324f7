//! Pluggable key-value storage backends for persisting ledger state.
//!
//! The ledger only ever reads and writes three opaque byte payloads,
//! one per [`StorageKey`]. Backends decide where those bytes live.

#[cfg(feature = "storage-file")]
mod file;
mod memory;

#[cfg(feature = "storage-file")]
pub use file::FileStorage;
pub use memory::InMemoryStorage;

use crate::error::Result;

/// Fixed logical keys under which ledger state is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// The ordered category list.
    Categories,
    /// All expense records.
    Expenses,
    /// All income records.
    Incomes,
}

impl StorageKey {
    /// Every key, in load order.
    pub const ALL: [Self; 3] = [Self::Categories, Self::Expenses, Self::Incomes];

    /// Returns the key's canonical name (`"categories"`, `"expenses"`,
    /// `"incomes"`).
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Expenses => "expenses",
            Self::Incomes => "incomes",
        }
    }
}

impl core::fmt::Display for StorageKey {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blocking key-value persistence used by [`crate::tracker::Tracker`].
///
/// All methods take `&self`, so implementations should use interior
/// mutability (e.g. `Mutex`) for thread-safe mutation.
pub trait KeyValueStore: core::fmt::Debug + Send + Sync {
    /// Returns the bytes last saved under `key`.
    ///
    /// Returns `Ok(None)` if nothing has been saved under `key` yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to read.
    fn load(&self, key: StorageKey) -> Result<Option<Vec<u8>>>;

    /// Replaces the bytes stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend fails to write.
    fn save(&self, key: StorageKey, bytes: &[u8]) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    #[inline]
    fn load(&self, key: StorageKey) -> Result<Option<Vec<u8>>> {
        (**self).load(key)
    }

    #[inline]
    fn save(&self, key: StorageKey, bytes: &[u8]) -> Result<()> {
        (**self).save(key, bytes)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    #[inline]
    fn load(&self, key: StorageKey) -> Result<Option<Vec<u8>>> {
        (**self).load(key)
    }

    #[inline]
    fn save(&self, key: StorageKey, bytes: &[u8]) -> Result<()> {
        (**self).save(key, bytes)
    }
}

//! Ledger persistence as one JSON document per key on disk.
//!
//! The default location is `$XDG_DATA_HOME/expense-ledger/`.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{KeyValueStore, StorageKey};
use crate::error::{LedgerError, Result, lock_poison_error, storage_io_error};

/// Directory name under the platform data directory.
const APP_NAME: &str = "expense-ledger";

/// Advisory lock file shared by every process using the directory.
const LOCK_FILE: &str = "ledger.lock";

/// Suffix of the scratch file a save writes before renaming into place.
const PARTIAL_SUFFIX: &str = "partial";

/// How [`FileStorage::locked`] holds the directory lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockMode {
    /// Any number of readers.
    Read,
    /// A single writer.
    Write,
}

/// Stores each ledger collection in its own JSON file.
///
/// ```text
/// <dir>/
///   ledger.lock
///   categories.json
///   expenses.json
///   incomes.json
/// ```
///
/// Saves go through a `<key>.json.partial` file that is renamed over the
/// target, so a crash mid-write leaves the previous document intact. A
/// process-local mutex plus an advisory lock on `ledger.lock` keep
/// concurrent readers and writers apart, including across processes.
#[derive(Debug)]
pub struct FileStorage {
    /// Directory holding the documents.
    dir: PathBuf,
    /// Serializes access from threads of this process.
    guard: Mutex<()>,
    /// Open handle to the advisory lock file.
    lock_file: File,
}

impl FileStorage {
    /// Opens (creating if needed) a storage directory.
    ///
    /// Leftover `.partial` files from an interrupted save are removed.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if the directory or its lock file
    /// cannot be created.
    #[inline]
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(storage_io_error)?;
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))
            .map_err(storage_io_error)?;
        let storage = Self {
            dir,
            guard: Mutex::new(()),
            lock_file,
        };
        storage.locked(LockMode::Write, || storage.discard_partials())?;
        tracing::debug!(dir = %storage.dir.display(), "opened ledger directory");
        Ok(storage)
    }

    /// Platform data directory for the ledger, e.g.
    /// `~/.local/share/expense-ledger/` on Linux.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] if the platform has no data
    /// directory.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        let Some(base) = dirs::data_dir() else {
            return Err(LedgerError::Storage(
                "could not determine platform data directory".into(),
            ));
        };
        Ok(base.join(APP_NAME))
    }

    /// The storage directory.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Path of the document for `key`.
    fn document(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }

    /// Path of the scratch file for `key`.
    fn partial(&self, key: StorageKey) -> PathBuf {
        self.dir
            .join(format!("{}.json.{PARTIAL_SUFFIX}", key.as_str()))
    }

    /// Runs `op` while holding both the process mutex and the file lock.
    ///
    /// An unlock failure is reported only when `op` itself succeeded.
    fn locked<R, F: FnOnce() -> Result<R>>(&self, mode: LockMode, op: F) -> Result<R> {
        let _held = self.guard.lock().map_err(|err| lock_poison_error(&err))?;
        let acquired = match mode {
            LockMode::Read => self.lock_file.lock_shared(),
            LockMode::Write => self.lock_file.lock(),
        };
        acquired.map_err(storage_io_error)?;

        let outcome = op();
        match (self.lock_file.unlock(), outcome) {
            (Err(err), Ok(_)) => Err(storage_io_error(err)),
            (_, outcome) => outcome,
        }
    }

    /// Removes scratch files left by an interrupted save.
    fn discard_partials(&self) -> Result<()> {
        for key in StorageKey::ALL {
            match fs::remove_file(self.partial(key)) {
                Ok(()) => tracing::warn!(key = %key, "discarded interrupted write"),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(storage_io_error(err)),
            }
        }
        Ok(())
    }
}

impl KeyValueStore for FileStorage {
    #[inline]
    fn load(&self, key: StorageKey) -> Result<Option<Vec<u8>>> {
        self.locked(LockMode::Read, || match fs::read(self.document(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(storage_io_error(err)),
        })
    }

    #[inline]
    fn save(&self, key: StorageKey, bytes: &[u8]) -> Result<()> {
        tracing::trace!(key = %key, len = bytes.len(), "saving document");
        self.locked(LockMode::Write, || {
            let partial = self.partial(key);
            fs::write(&partial, bytes).map_err(storage_io_error)?;
            fs::rename(&partial, self.document(key)).map_err(storage_io_error)
        })
    }
}

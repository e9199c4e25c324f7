//! Error types for the expense ledger.

use crate::models::CategoryId;

/// All errors that can occur when using the ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// JSON serialization or deserialization of persisted data failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend failed.
    #[error("storage error: {0}")]
    Storage(Box<dyn core::error::Error + Send + Sync>),

    /// Amount is not a finite, strictly positive number.
    #[error("invalid amount: {0}")]
    InvalidAmount(f64),

    /// An expense refers to a category that does not exist.
    #[error("unknown category: {0}")]
    UnknownCategory(CategoryId),

    /// An entity with the same id is already present.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// A reorder request is not a permutation of the current categories.
    #[error("reorder must list every existing category exactly once")]
    InvalidReorder,

    /// A backup document is structurally invalid; nothing was imported.
    #[error("invalid backup at {location}: {message}")]
    InvalidBackup {
        /// Field path or `line:column` where the problem was found.
        location: String,
        /// Human-readable description of the problem.
        message: String,
    },

    /// A background unit of work panicked or was cancelled.
    #[cfg(feature = "async")]
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl LedgerError {
    /// Builds an [`LedgerError::InvalidBackup`] from a failed backup parse.
    ///
    /// The location is the field path (e.g. `expenses[0].amount`) for a
    /// missing or mistyped field below the document root, and
    /// `line:column` for malformed JSON or a problem with the root object
    /// itself. The message always carries the line and column.
    #[inline]
    #[must_use]
    pub fn from_backup_parse(err: &serde_path_to_error::Error<serde_json::Error>) -> Self {
        let inner = err.inner();
        let path = err.path().to_string();
        let location = if inner.is_syntax() || inner.is_eof() || path == "." {
            json_position(inner)
        } else {
            path
        };
        Self::InvalidBackup {
            location,
            message: inner.to_string(),
        }
    }

    /// Builds an [`LedgerError::InvalidBackup`] from a JSON error with no
    /// field path, such as trailing bytes after the document.
    #[inline]
    #[must_use]
    pub fn from_backup_syntax(err: &serde_json::Error) -> Self {
        Self::InvalidBackup {
            location: json_position(err),
            message: err.to_string(),
        }
    }
}

/// Convenience alias for results in this crate.
pub type Result<T> = core::result::Result<T, LedgerError>;

/// `line:column` of a JSON error.
fn json_position(err: &serde_json::Error) -> String {
    format!("{}:{}", err.line(), err.column())
}

/// Wraps an I/O error into a [`LedgerError::Storage`].
pub(crate) fn storage_io_error(err: std::io::Error) -> LedgerError {
    LedgerError::Storage(Box::new(err))
}

/// Wraps a mutex poison error into a [`LedgerError::Storage`].
pub(crate) fn lock_poison_error<T>(err: &std::sync::PoisonError<T>) -> LedgerError {
    LedgerError::Storage(err.to_string().into())
}

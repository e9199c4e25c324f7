//! Income model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::IncomeId;

/// A single income entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    /// Unique identifier.
    pub id: IncomeId,
    /// Amount received (> 0).
    pub amount: f64,
    /// When the income was received.
    pub date: DateTime<Utc>,
    /// Optional note, conventionally the income source.
    #[serde(default)]
    pub note: Option<String>,
}

impl Income {
    /// Creates an income with a freshly generated id.
    #[inline]
    #[must_use]
    pub fn new(amount: f64, date: DateTime<Utc>, note: Option<String>) -> Self {
        Self {
            id: IncomeId::generate(),
            amount,
            date,
            note,
        }
    }
}

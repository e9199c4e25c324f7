//! Expense models: the stored record and its materialized view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, CategoryId, ExpenseId};

/// An expense as stored by the ledger.
///
/// The category is held by id. Use [`ExpenseRecord::materialize`] to
/// obtain an [`Expense`] with the full category attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRecord {
    /// Unique identifier (UUID).
    pub id: ExpenseId,
    /// Amount spent (> 0).
    pub amount: f64,
    /// Category this expense is filed under.
    pub category_id: CategoryId,
    /// When the expense happened.
    pub date: DateTime<Utc>,
    /// Optional free-text note.
    #[serde(default)]
    pub note: Option<String>,
}

impl ExpenseRecord {
    /// Creates a record with a freshly generated id.
    #[inline]
    #[must_use]
    pub fn new(
        amount: f64,
        category_id: CategoryId,
        date: DateTime<Utc>,
        note: Option<String>,
    ) -> Self {
        Self {
            id: ExpenseId::generate(),
            amount,
            category_id,
            date,
            note,
        }
    }

    /// Attaches a snapshot of `category` to this record.
    ///
    /// The caller is responsible for passing the category whose id
    /// matches [`Self::category_id`].
    #[inline]
    #[must_use]
    pub fn materialize(&self, category: &Category) -> Expense {
        Expense {
            id: self.id,
            amount: self.amount,
            category: category.clone(),
            date: self.date,
            note: self.note.clone(),
        }
    }
}

/// An expense with its category resolved, as handed to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier (UUID).
    pub id: ExpenseId,
    /// Amount spent (> 0).
    pub amount: f64,
    /// Current snapshot of the expense's category.
    pub category: Category,
    /// When the expense happened.
    pub date: DateTime<Utc>,
    /// Optional free-text note.
    pub note: Option<String>,
}

impl Expense {
    /// Drops the category snapshot, keeping only its id.
    #[inline]
    #[must_use]
    pub fn to_record(&self) -> ExpenseRecord {
        ExpenseRecord {
            id: self.id,
            amount: self.amount,
            category_id: self.category.id,
            date: self.date,
            note: self.note.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_record_without_note() {
        let json = r#"{
            "id": "6f1c2a9e-1b7d-4c57-9a55-2f0f6f9d0a01",
            "amount": 12.5,
            "categoryId": "a1b2c3d4-0000-4000-8000-000000000000",
            "date": "2024-03-10T08:30:00Z"
        }"#;
        let record: ExpenseRecord = serde_json::from_str(json).unwrap();
        assert!((record.amount - 12.5).abs() < f64::EPSILON);
        assert!(record.note.is_none());
        assert_eq!(record.date.to_rfc3339(), "2024-03-10T08:30:00+00:00");
    }

    #[test]
    fn materialize_then_to_record_is_identity() {
        let category = Category::new("Food", "#FF6B6B", "f");
        let record = ExpenseRecord::new(
            40.0,
            category.id,
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            Some("lunch".to_owned()),
        );
        let expense = record.materialize(&category);
        assert_eq!(expense.category, category);
        assert_eq!(expense.to_record(), record);
    }
}

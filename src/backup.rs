//! Versioned JSON backup documents.
//!
//! A backup holds the full ledger: categories, expenses (referencing
//! categories by id) and incomes. Export is lossless. Import is
//! all-or-nothing for structural problems and record-by-record for
//! everything else, with each dropped record listed in an
//! [`ImportReport`].

use core::fmt;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::categories::CategoryStore;
use crate::error::{LedgerError, Result};
use crate::ledger::{LedgerStore, validate_amount};
use crate::models::{Category, CategoryId, ExpenseId, ExpenseRecord, Income, IncomeId};

/// Schema version written to and required from backup documents.
pub const BACKUP_SCHEMA_VERSION: &str = "1.0";

/// Top-level backup document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    /// Schema version; must equal [`BACKUP_SCHEMA_VERSION`] on import.
    pub version: String,
    /// When the backup was produced.
    pub export_date: DateTime<Utc>,
    /// Categories in display order.
    pub categories: Vec<BackupCategory>,
    /// Expenses, referencing categories by id.
    pub expenses: Vec<BackupExpense>,
    /// Incomes.
    pub incomes: Vec<BackupIncome>,
}

/// A category as written in a backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupCategory {
    /// Category id (UUID string).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Hex color.
    pub color: String,
    /// Display icon.
    pub icon: String,
}

/// An expense as written in a backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupExpense {
    /// Expense id (UUID string).
    pub id: String,
    /// Amount spent.
    pub amount: f64,
    /// Id of the category the expense is filed under.
    pub category_id: String,
    /// When the expense happened.
    pub date: DateTime<Utc>,
    /// Optional note; absent and `null` both mean none.
    #[serde(default)]
    pub note: Option<String>,
}

/// An income as written in a backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupIncome {
    /// Income id (any non-empty string).
    pub id: String,
    /// Amount received.
    pub amount: f64,
    /// When the income was received.
    pub date: DateTime<Utc>,
    /// Optional note; absent and `null` both mean none.
    #[serde(default)]
    pub note: Option<String>,
}

impl BackupDocument {
    /// Builds a document from the live ledger state.
    #[must_use]
    pub fn from_snapshot(
        categories: &[Category],
        expenses: &[ExpenseRecord],
        incomes: &[Income],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            version: BACKUP_SCHEMA_VERSION.to_owned(),
            export_date: now,
            categories: categories
                .iter()
                .map(|category| BackupCategory {
                    id: category.id.to_string(),
                    name: category.name.clone(),
                    color: category.color.clone(),
                    icon: category.icon.clone(),
                })
                .collect(),
            expenses: expenses
                .iter()
                .map(|record| BackupExpense {
                    id: record.id.to_string(),
                    amount: record.amount,
                    category_id: record.category_id.to_string(),
                    date: record.date,
                    note: record.note.clone(),
                })
                .collect(),
            incomes: incomes
                .iter()
                .map(|income| BackupIncome {
                    id: income.id.to_string(),
                    amount: income.amount,
                    date: income.date,
                    note: income.note.clone(),
                })
                .collect(),
        }
    }

    /// Serializes the document as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Serialization`] if encoding fails.
    #[inline]
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a document and checks its version.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidBackup`] if the bytes are not valid
    /// JSON, a required field is missing or mistyped, or the version is
    /// not [`BACKUP_SCHEMA_VERSION`].
    #[inline]
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut de = serde_json::Deserializer::from_slice(bytes);
        let document: Self = serde_path_to_error::deserialize(&mut de)
            .map_err(|err| LedgerError::from_backup_parse(&err))?;
        de.end().map_err(|err| LedgerError::from_backup_syntax(&err))?;
        if document.version != BACKUP_SCHEMA_VERSION {
            return Err(LedgerError::InvalidBackup {
                location: "version".to_owned(),
                message: format!(
                    "unsupported version `{}`, expected `{BACKUP_SCHEMA_VERSION}`",
                    document.version
                ),
            });
        }
        Ok(document)
    }

    /// Converts the document into ledger state, skipping records that
    /// cannot be restored.
    #[must_use]
    pub fn restore(self) -> (RestoredLedger, ImportReport) {
        let mut report = ImportReport::default();

        let mut categories = CategoryStore::new();
        for raw in self.categories {
            let Ok(id) = CategoryId::parse(&raw.id) else {
                report.skip(RecordKind::Category, raw.id, SkipReason::MalformedId);
                continue;
            };
            let category = Category {
                id,
                name: raw.name,
                color: raw.color,
                icon: raw.icon,
            };
            if categories.add(category).is_err() {
                report.skip(RecordKind::Category, raw.id, SkipReason::DuplicateId);
            }
        }

        let mut expense_ids = HashSet::with_capacity(self.expenses.len());
        let mut expenses = Vec::with_capacity(self.expenses.len());
        for raw in self.expenses {
            let Ok(id) = ExpenseId::parse(&raw.id) else {
                report.skip(RecordKind::Expense, raw.id, SkipReason::MalformedId);
                continue;
            };
            if validate_amount(raw.amount).is_err() {
                report.skip(RecordKind::Expense, raw.id, SkipReason::InvalidAmount(raw.amount));
                continue;
            }
            let category_id = match CategoryId::parse(&raw.category_id) {
                Ok(category_id) if categories.contains(category_id) => category_id,
                Ok(_) | Err(_) => {
                    report.skip(
                        RecordKind::Expense,
                        raw.id,
                        SkipReason::UnknownCategory(raw.category_id),
                    );
                    continue;
                }
            };
            if !expense_ids.insert(id) {
                report.skip(RecordKind::Expense, raw.id, SkipReason::DuplicateId);
                continue;
            }
            expenses.push(ExpenseRecord {
                id,
                amount: raw.amount,
                category_id,
                date: raw.date,
                note: raw.note,
            });
        }

        let mut income_ids = HashSet::with_capacity(self.incomes.len());
        let mut incomes = Vec::with_capacity(self.incomes.len());
        for raw in self.incomes {
            if raw.id.trim().is_empty() {
                report.skip(RecordKind::Income, raw.id, SkipReason::MalformedId);
                continue;
            }
            if validate_amount(raw.amount).is_err() {
                report.skip(RecordKind::Income, raw.id, SkipReason::InvalidAmount(raw.amount));
                continue;
            }
            if !income_ids.insert(raw.id.clone()) {
                report.skip(RecordKind::Income, raw.id, SkipReason::DuplicateId);
                continue;
            }
            incomes.push(Income {
                id: IncomeId::new(raw.id),
                amount: raw.amount,
                date: raw.date,
                note: raw.note,
            });
        }

        report.categories_imported = categories.len();
        report.expenses_imported = expenses.len();
        report.incomes_imported = incomes.len();

        let restored = RestoredLedger {
            categories,
            ledger: LedgerStore::from_records(expenses, incomes),
        };
        (restored, report)
    }
}

/// Ledger state rebuilt from a backup, ready to replace the live state.
#[derive(Debug, Clone)]
pub struct RestoredLedger {
    /// Restored categories, in document order.
    pub categories: CategoryStore,
    /// Restored expenses and incomes.
    pub ledger: LedgerStore,
}

/// Outcome of an import that was not rejected outright.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    /// Number of categories restored.
    pub categories_imported: usize,
    /// Number of expenses restored.
    pub expenses_imported: usize,
    /// Number of incomes restored.
    pub incomes_imported: usize,
    /// Records that were dropped, in document order.
    pub skipped: Vec<SkippedRecord>,
}

impl ImportReport {
    /// Returns `true` if every record was restored.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    /// Records a dropped record and logs it.
    fn skip(&mut self, kind: RecordKind, id: String, reason: SkipReason) {
        tracing::warn!(%kind, %id, %reason, "skipping backup record");
        self.skipped.push(SkippedRecord { kind, id, reason });
    }
}

/// A record left out of an import.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    /// What sort of record it was.
    pub kind: RecordKind,
    /// The id exactly as it appeared in the document.
    pub id: String,
    /// Why it was dropped.
    pub reason: SkipReason,
}

/// Kinds of record held in a backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// A category.
    Category,
    /// An expense.
    Expense,
    /// An income.
    Income,
}

impl fmt::Display for RecordKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Category => "category",
            Self::Expense => "expense",
            Self::Income => "income",
        })
    }
}

/// Why a record was dropped during import.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The id is not a valid UUID, or is empty for incomes.
    MalformedId,
    /// An earlier record of the same kind had this id.
    DuplicateId,
    /// The expense's category id does not match any restored category.
    UnknownCategory(String),
    /// The amount is not finite and strictly positive.
    InvalidAmount(f64),
}

impl fmt::Display for SkipReason {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedId => f.write_str("malformed id"),
            Self::DuplicateId => f.write_str("duplicate id"),
            Self::UnknownCategory(id) => write!(f, "unknown category `{id}`"),
            Self::InvalidAmount(amount) => write!(f, "invalid amount {amount}"),
        }
    }
}

/// File name for a backup taken at `now`: `ExpenseTracker_YYYYMMDD_HHMMSS.json`.
#[inline]
#[must_use]
pub fn backup_file_name(now: DateTime<Utc>) -> String {
    format!("ExpenseTracker_{}.json", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    const FOOD_ID: &str = "a1b2c3d4-0000-4000-8000-000000000001";
    const EXPENSE_ID: &str = "6f1c2a9e-1b7d-4c57-9a55-2f0f6f9d0a01";

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap()
    }

    fn document(expenses: &str, incomes: &str) -> String {
        format!(
            r##"{{
                "version": "1.0",
                "exportDate": "2024-05-01T10:00:00Z",
                "categories": [
                    {{"id": "{FOOD_ID}", "name": "Food", "color": "#FF6B6B", "icon": "f"}}
                ],
                "expenses": [{expenses}],
                "incomes": [{incomes}]
            }}"##
        )
    }

    fn invalid_location(bytes: &[u8]) -> String {
        match BackupDocument::from_slice(bytes) {
            Err(LedgerError::InvalidBackup { location, .. }) => location,
            other => panic!("expected invalid backup, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_roundtrip() {
        let food = Category::new("Food", "#FF6B6B", "f");
        let expense = ExpenseRecord::new(100.0, food.id, at(2024, 5, 1), Some("lunch".to_owned()));
        let income = Income::new(50.0, at(2024, 5, 2), None);

        let doc = BackupDocument::from_snapshot(
            core::slice::from_ref(&food),
            core::slice::from_ref(&expense),
            core::slice::from_ref(&income),
            at(2024, 5, 3),
        );
        let json = doc.to_json_pretty().unwrap();
        assert!(json.contains("\"categoryId\""));
        assert!(json.contains("\"exportDate\""));

        let (restored, report) = BackupDocument::from_slice(json.as_bytes()).unwrap().restore();
        assert!(report.is_complete());
        assert_eq!(report.expenses_imported, 1);
        assert_eq!(restored.categories.list(), [food]);
        assert_eq!(restored.ledger.expenses(), [expense]);
        assert_eq!(restored.ledger.incomes(), [income]);
    }

    #[test]
    fn note_absent_or_null_is_none() {
        let json = document(
            &format!(
                r#"{{"id": "{EXPENSE_ID}", "amount": 5.0, "categoryId": "{FOOD_ID}", "date": "2024-05-01T10:00:00Z", "note": null}}"#
            ),
            r#"{"id": "salary-may", "amount": 10.0, "date": "2024-05-01T10:00:00Z"}"#,
        );
        let (restored, report) = BackupDocument::from_slice(json.as_bytes()).unwrap().restore();
        assert!(report.is_complete());
        assert!(restored.ledger.expenses()[0].note.is_none());
        assert!(restored.ledger.incomes()[0].note.is_none());
    }

    #[test]
    fn malformed_json_reports_position() {
        let location = invalid_location(b"{\n  \"version\": \"1.0\",\n  oops");
        assert!(location.starts_with("3:"));
    }

    #[test]
    fn missing_field_is_structural() {
        let json = r#"{"version": "1.0", "exportDate": "2024-05-01T10:00:00Z", "categories": []}"#;
        match BackupDocument::from_slice(json.as_bytes()) {
            Err(LedgerError::InvalidBackup { location, message }) => {
                assert!(location.starts_with("1:"));
                assert!(message.contains("expenses"));
            }
            other => panic!("expected invalid backup, got {other:?}"),
        }
    }

    #[test]
    fn type_mismatch_is_structural() {
        let json = document(
            &format!(
                r#"{{"id": "{EXPENSE_ID}", "amount": "lots", "categoryId": "{FOOD_ID}", "date": "2024-05-01T10:00:00Z"}}"#
            ),
            "",
        );
        assert_eq!(invalid_location(json.as_bytes()), "expenses[0].amount");
    }

    #[test]
    fn nested_income_field_is_named() {
        let json = document("", r#"{"id": "s1", "amount": 10.0, "date": "yesterday"}"#);
        assert_eq!(invalid_location(json.as_bytes()), "incomes[0].date");
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let json = format!("{}\n  extra", document("", ""));
        assert!(invalid_location(json.as_bytes()).contains(':'));
    }

    #[test]
    fn amounts_survive_export_bit_for_bit() {
        let food = Category::new("Food", "#FF6B6B", "f");
        let amounts = [
            124_215.645_907_723_17,
            0.1 + 0.2,
            1_000.0 * core::f64::consts::PI,
            1e-7,
        ];
        let expenses: Vec<ExpenseRecord> = amounts
            .iter()
            .map(|amount| ExpenseRecord::new(*amount, food.id, at(2024, 5, 1), None))
            .collect();
        let incomes: Vec<Income> = amounts
            .iter()
            .map(|amount| Income::new(*amount, at(2024, 5, 1), None))
            .collect();

        let json = BackupDocument::from_snapshot(
            core::slice::from_ref(&food),
            &expenses,
            &incomes,
            at(2024, 5, 2),
        )
        .to_json_pretty()
        .unwrap();
        let (restored, report) = BackupDocument::from_slice(json.as_bytes()).unwrap().restore();
        assert!(report.is_complete());

        for original in &expenses {
            let copy = restored.ledger.expense(original.id).unwrap();
            assert_eq!(copy.amount.to_bits(), original.amount.to_bits());
        }
        for original in &incomes {
            let copy = restored.ledger.income(&original.id).unwrap();
            assert_eq!(copy.amount.to_bits(), original.amount.to_bits());
        }
    }

    #[test]
    fn duplicate_category_keeps_first_and_its_expenses() {
        let json = format!(
            r##"{{
                "version": "1.0",
                "exportDate": "2024-05-01T10:00:00Z",
                "categories": [
                    {{"id": "{FOOD_ID}", "name": "Food", "color": "#FF6B6B", "icon": "f"}},
                    {{"id": "{FOOD_ID}", "name": "Groceries", "color": "#4ECDC4", "icon": "g"}}
                ],
                "expenses": [{{"id": "{EXPENSE_ID}", "amount": 5.0, "categoryId": "{FOOD_ID}", "date": "2024-05-01T10:00:00Z"}}],
                "incomes": []
            }}"##
        );
        let (restored, report) = BackupDocument::from_slice(json.as_bytes()).unwrap().restore();

        assert_eq!(report.categories_imported, 1);
        assert_eq!(restored.categories.list()[0].name, "Food");
        let reasons: Vec<(RecordKind, &SkipReason)> =
            report.skipped.iter().map(|s| (s.kind, &s.reason)).collect();
        assert_eq!(reasons, [(RecordKind::Category, &SkipReason::DuplicateId)]);
        assert_eq!(report.skipped[0].id, FOOD_ID);

        assert_eq!(report.expenses_imported, 1);
        assert_eq!(
            restored.ledger.expenses()[0].category_id,
            CategoryId::parse(FOOD_ID).unwrap()
        );
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let json = document("", "").replace("\"1.0\"", "\"2.0\"");
        assert_eq!(invalid_location(json.as_bytes()), "version");
    }

    #[test]
    fn record_level_problems_are_skipped() {
        let expenses = format!(
            r#"
            {{"id": "{EXPENSE_ID}", "amount": 5.0, "categoryId": "{FOOD_ID}", "date": "2024-05-01T10:00:00Z"}},
            {{"id": "{EXPENSE_ID}", "amount": 6.0, "categoryId": "{FOOD_ID}", "date": "2024-05-01T10:00:00Z"}},
            {{"id": "not-a-uuid", "amount": 5.0, "categoryId": "{FOOD_ID}", "date": "2024-05-01T10:00:00Z"}},
            {{"id": "6f1c2a9e-1b7d-4c57-9a55-2f0f6f9d0a02", "amount": 5.0, "categoryId": "a1b2c3d4-0000-4000-8000-0000000000ff", "date": "2024-05-01T10:00:00Z"}},
            {{"id": "6f1c2a9e-1b7d-4c57-9a55-2f0f6f9d0a03", "amount": -1.0, "categoryId": "{FOOD_ID}", "date": "2024-05-01T10:00:00Z"}}
            "#
        );
        let incomes = r#"
            {"id": "", "amount": 10.0, "date": "2024-05-01T10:00:00Z"},
            {"id": "s1", "amount": 10.0, "date": "2024-05-01T10:00:00Z"},
            {"id": "s1", "amount": 11.0, "date": "2024-05-02T10:00:00Z"}
        "#;
        let json = document(&expenses, incomes);
        let (restored, report) = BackupDocument::from_slice(json.as_bytes()).unwrap().restore();

        assert_eq!(restored.ledger.expenses().len(), 1);
        assert_eq!(restored.ledger.incomes().len(), 1);
        assert_eq!(report.expenses_imported, 1);
        assert_eq!(report.incomes_imported, 1);

        let reasons: Vec<(RecordKind, &SkipReason)> =
            report.skipped.iter().map(|s| (s.kind, &s.reason)).collect();
        assert_eq!(
            reasons,
            [
                (RecordKind::Expense, &SkipReason::DuplicateId),
                (RecordKind::Expense, &SkipReason::MalformedId),
                (
                    RecordKind::Expense,
                    &SkipReason::UnknownCategory("a1b2c3d4-0000-4000-8000-0000000000ff".to_owned())
                ),
                (RecordKind::Expense, &SkipReason::InvalidAmount(-1.0)),
                (RecordKind::Income, &SkipReason::MalformedId),
                (RecordKind::Income, &SkipReason::DuplicateId),
            ]
        );
    }

    #[test]
    fn expense_of_skipped_category_is_skipped() {
        let json = format!(
            r##"{{
                "version": "1.0",
                "exportDate": "2024-05-01T10:00:00Z",
                "categories": [{{"id": "bad", "name": "Food", "color": "#FF6B6B", "icon": "f"}}],
                "expenses": [{{"id": "{EXPENSE_ID}", "amount": 5.0, "categoryId": "bad", "date": "2024-05-01T10:00:00Z"}}],
                "incomes": []
            }}"##
        );
        let (restored, report) = BackupDocument::from_slice(json.as_bytes()).unwrap().restore();
        assert!(restored.categories.is_empty());
        assert!(restored.ledger.expenses().is_empty());
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].kind, RecordKind::Category);
    }

    #[test]
    fn file_name_format() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 5, 7).unwrap();
        assert_eq!(backup_file_name(now), "ExpenseTracker_20240501_090507.json");
    }

    #[test]
    fn skip_reason_display() {
        assert_eq!(SkipReason::UnknownCategory("x".to_owned()).to_string(), "unknown category `x`");
        assert_eq!(RecordKind::Income.to_string(), "income");
    }
}

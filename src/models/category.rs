//! Spending category model.

use serde::{Deserialize, Serialize};

use super::CategoryId;

/// A user-defined spending tag.
///
/// Identity is the `id`; every other field may be edited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier (UUID).
    pub id: CategoryId,
    /// Display name. Not required to be unique.
    pub name: String,
    /// Hex color string, e.g. `#FF6B6B`.
    pub color: String,
    /// Short display string, usually a single emoji.
    pub icon: String,
}

impl Category {
    /// Creates a category with a freshly generated id.
    #[inline]
    #[must_use]
    pub fn new<N, C, I>(name: N, color: C, icon: I) -> Self
    where
        N: Into<String>,
        C: Into<String>,
        I: Into<String>,
    {
        Self {
            id: CategoryId::generate(),
            name: name.into(),
            color: color.into(),
            icon: icon.into(),
        }
    }

    /// Returns a copy of `self` carrying `id` instead of its own.
    #[inline]
    #[must_use]
    pub fn with_id(self, id: CategoryId) -> Self {
        Self { id, ..self }
    }
}

/// Name, color and icon of the categories seeded on first run.
const DEFAULT_CATEGORIES: [(&str, &str, &str); 7] = [
    ("Food", "#FF6B6B", "\u{1f354}"),
    ("Transport", "#4ECDC4", "\u{1f697}"),
    ("Entertainment", "#FFE66D", "\u{1f3ae}"),
    ("Shopping", "#95E1D3", "\u{1f6cd}\u{fe0f}"),
    ("Health", "#C7CEEA", "\u{1f48a}"),
    ("Utilities", "#AA96DA", "\u{1f3e0}"),
    ("Other", "#CCCCCC", "\u{1f4cc}"),
];

/// Builds the default category set, each with a fresh id.
#[inline]
#[must_use]
pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|&(name, color, icon)| Category::new(name, color, icon))
        .collect()
}

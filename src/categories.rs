//! Ordered collection of spending categories.

use std::collections::HashSet;

use crate::error::{LedgerError, Result};
use crate::models::{Category, CategoryId, default_categories};

/// Owns the user's categories in display order.
///
/// The store only enforces id uniqueness. Keeping expenses consistent
/// with deletions is the job of [`crate::tracker::Tracker`], which pairs
/// every category delete with a cascading expense delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryStore {
    /// Categories in insertion / manual-reorder order.
    categories: Vec<Category>,
}

impl CategoryStore {
    /// Creates an empty store.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the seven default categories.
    #[inline]
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            categories: default_categories(),
        }
    }

    /// Builds a store from previously persisted categories.
    ///
    /// Later duplicates of an id are dropped with a warning.
    #[inline]
    #[must_use]
    pub fn from_categories(categories: Vec<Category>) -> Self {
        let mut seen = HashSet::with_capacity(categories.len());
        let categories = categories
            .into_iter()
            .filter(|category| {
                let fresh = seen.insert(category.id);
                if !fresh {
                    tracing::warn!(id = %category.id, "dropping duplicate category");
                }
                fresh
            })
            .collect();
        Self { categories }
    }

    /// Returns all categories in display order.
    #[inline]
    #[must_use]
    pub fn list(&self) -> &[Category] {
        &self.categories
    }

    /// Returns the number of categories.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Returns `true` if there are no categories.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Looks up a category by id.
    #[inline]
    #[must_use]
    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Returns `true` if a category with this id exists.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: CategoryId) -> bool {
        self.get(id).is_some()
    }

    /// Finds the first category with the given name (case-insensitive).
    #[inline]
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Category> {
        let lower = name.to_lowercase();
        self.categories
            .iter()
            .find(|category| category.name.to_lowercase() == lower)
    }

    /// Appends a category. Names may repeat; ids may not.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateId`] if the id is already present.
    #[inline]
    pub fn add(&mut self, category: Category) -> Result<()> {
        if self.contains(category.id) {
            return Err(LedgerError::DuplicateId(category.id.to_string()));
        }
        tracing::debug!(id = %category.id, name = %category.name, "adding category");
        self.categories.push(category);
        Ok(())
    }

    /// Removes a category. Returns `false` if the id was unknown.
    #[inline]
    pub fn delete(&mut self, id: CategoryId) -> bool {
        let before = self.categories.len();
        self.categories.retain(|category| category.id != id);
        before != self.categories.len()
    }

    /// Replaces name, color and icon of the category with this id.
    ///
    /// The stored id is always `id`, whatever `replacement.id` says.
    /// Returns `false` (and changes nothing) if the id was unknown.
    #[inline]
    pub fn edit(&mut self, id: CategoryId, replacement: Category) -> bool {
        match self.categories.iter_mut().find(|category| category.id == id) {
            Some(slot) => {
                *slot = replacement.with_id(id);
                true
            }
            None => {
                tracing::warn!(id = %id, "category to edit not found");
                false
            }
        }
    }

    /// Reorders categories to match `order`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidReorder`] unless `order` lists every
    /// current id exactly once. The store is unchanged on error.
    #[inline]
    pub fn reorder(&mut self, order: &[CategoryId]) -> Result<()> {
        let wanted: HashSet<CategoryId> = order.iter().copied().collect();
        let is_permutation = order.len() == self.categories.len()
            && wanted.len() == order.len()
            && self.categories.iter().all(|category| wanted.contains(&category.id));
        if !is_permutation {
            return Err(LedgerError::InvalidReorder);
        }
        self.categories
            .sort_by_key(|category| order.iter().position(|id| *id == category.id));
        Ok(())
    }

    /// Sorts categories alphabetically by name.
    #[inline]
    pub fn sort_by_name(&mut self) {
        self.categories.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

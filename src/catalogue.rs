//! Sparse, immutable-after-load map of category id → [`Category`] (§3, §4.G).
//!
//! Built once from an external XML-described UAP source (out of scope —
//! see spec §6) and shared read-only across any number of concurrent
//! decode invocations (§5).
use std::collections::BTreeMap;

use crate::category::Category;
use crate::error::CatalogueError;

/// Category ids span `0..=255`; pseudo-category `256` holds the
/// Mode-S Comm-B "BDS" register table that [`crate::format::FormatStrategy::Bds`]
/// dispatches through.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    categories: BTreeMap<u16, Category>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self { categories: BTreeMap::new() }
    }

    pub fn insert(&mut self, category: Category) -> Result<(), CatalogueError> {
        if category.id > 256 {
            return Err(CatalogueError::CategoryIdOutOfRange { category: category.id as u32 });
        }
        category.validate()?;
        if self.categories.contains_key(&category.id) {
            return Err(CatalogueError::DuplicateCategory(category.id));
        }
        self.categories.insert(category.id, category);
        Ok(())
    }

    pub fn get(&self, id: u16) -> Option<&Category> {
        self.categories.get(&id)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

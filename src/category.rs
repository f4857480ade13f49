//! One ASTERIX category: its item table and the UAP(s) that select among
//! its items (§3).
use std::collections::BTreeMap;

use crate::error::{CatalogueError, DecodeError};
use crate::format::FormatStrategy;
use crate::item::ItemDescription;
use crate::uap::{Uap, UapSet};

#[derive(Debug, Clone)]
pub struct Category {
    pub id: u16,
    pub name: String,
    pub version: String,
    pub items: BTreeMap<String, ItemDescription>,
    pub uaps: UapSet,
    /// Whether [`crate::filter::Filter`] is even consulted for this
    /// category — some raw plot categories are never filtered (§3's
    /// `filter_flag`, grounded in the original `Category` class).
    pub filter_flag: bool,
}

impl Category {
    pub fn new(id: u16, name: impl Into<String>, version: impl Into<String>, uaps: Vec<Uap>) -> Self {
        Self {
            id,
            name: name.into(),
            version: version.into(),
            items: BTreeMap::new(),
            uaps: UapSet::new(uaps),
            filter_flag: true,
        }
    }

    pub fn with_item(mut self, item: ItemDescription) -> Self {
        self.items.insert(item.id.clone(), item);
        self
    }

    pub fn with_filter_flag(mut self, filter_flag: bool) -> Self {
        self.filter_flag = filter_flag;
        self
    }

    /// Validates §3's invariants: every item id referenced by any UAP is
    /// defined in `items`; where a UAP entry declares a length, it matches
    /// a Fixed item's actual byte length; and every field descriptor
    /// reachable from every item's format strategy obeys its own width/
    /// byte-extent invariants.
    pub fn validate(&self) -> Result<(), CatalogueError> {
        for item in self.items.values() {
            item.format.validate_fields(&item.id)?;
        }
        for uap in &self.uaps.uaps {
            for entry in uap.data_entries() {
                let id = entry.item_id.as_deref().unwrap_or_default();
                let item = self.items.get(id).ok_or_else(|| CatalogueError::DanglingUapEntry {
                    category: self.id,
                    item: id.to_string(),
                })?;
                if let (Some(declared), FormatStrategy::Fixed(fixed)) = (entry.declared_len, &item.format) {
                    if declared as usize != fixed.len {
                        return Err(CatalogueError::DeclaredLenMismatch {
                            category: self.id,
                            item: id.to_string(),
                            declared,
                            actual: fixed.len,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn resolve_uap(&self, fspec: &[u8]) -> Result<&Uap, DecodeError> {
        self.uaps.resolve(fspec).ok_or(DecodeError::NoApplicableUap(self.id))
    }
}

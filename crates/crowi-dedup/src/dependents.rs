//! Tables that hold references to pages.
//!
//! The list is exhaustive by contract: a table referencing pages that is not
//! listed here keeps pointing at removed pages after a merge.

use std::collections::BTreeSet;

use crate::error::ConfigError;

/// Restricts a polymorphic reference to rows whose `field` equals `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discriminator {
    pub field: &'static str,
    pub value: &'static str,
}

/// One foreign-key column pointing at `pages.id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependentCollection {
    pub collection: &'static str,
    pub field: &'static str,
    pub discriminator: Option<Discriminator>,
}

impl DependentCollection {
    pub const fn direct(collection: &'static str, field: &'static str) -> Self {
        Self {
            collection,
            field,
            discriminator: None,
        }
    }

    pub const fn polymorphic(
        collection: &'static str,
        field: &'static str,
        discriminator_field: &'static str,
        value: &'static str,
    ) -> Self {
        Self {
            collection,
            field,
            discriminator: Some(Discriminator {
                field: discriminator_field,
                value,
            }),
        }
    }
}

const PAGE_MODEL: &str = "Page";

pub const PAGE_DEPENDENTS: [DependentCollection; 9] = [
    DependentCollection::polymorphic("activities", "target_id", "target_model", PAGE_MODEL),
    DependentCollection::direct("attachments", "page_id"),
    DependentCollection::direct("bookmarks", "page_id"),
    DependentCollection::direct("backlinks", "page_id"),
    DependentCollection::direct("backlinks", "from_page_id"),
    DependentCollection::direct("comments", "page_id"),
    DependentCollection::polymorphic("notifications", "target_id", "target_model", PAGE_MODEL),
    DependentCollection::direct("shares", "page_id"),
    DependentCollection::polymorphic("watchers", "target_id", "target_model", PAGE_MODEL),
];

/// A validated list of dependent collections.
#[derive(Debug, Clone)]
pub struct DependentCollections {
    entries: Vec<DependentCollection>,
}

impl DependentCollections {
    /// Validate `entries`: no blank names, and no `(collection, field)` pair
    /// listed twice.
    pub fn new(
        entries: impl IntoIterator<Item = DependentCollection>,
    ) -> Result<Self, ConfigError> {
        let entries: Vec<_> = entries.into_iter().collect();
        let mut seen = BTreeSet::new();
        for entry in &entries {
            if entry.collection.trim().is_empty() || entry.field.trim().is_empty() {
                return Err(ConfigError::BlankDependent);
            }
            if let Some(d) = entry.discriminator {
                if d.field.trim().is_empty() {
                    return Err(ConfigError::BlankDependent);
                }
            }
            if !seen.insert((entry.collection, entry.field)) {
                return Err(ConfigError::DuplicateDependent {
                    collection: entry.collection.to_string(),
                    field: entry.field.to_string(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Every table referencing pages.
    pub fn pages() -> Result<Self, ConfigError> {
        Self::new(PAGE_DEPENDENTS)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DependentCollection> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

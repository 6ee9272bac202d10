//! Locally cached resource catalog.
//!
//! [`ResourceCatalog`] is the pure data structure: the fetched snapshot, the
//! current search query and the sort toggle. [`CatalogStore`] wraps it with
//! the service calls and notifications.

mod icons;
mod resource;
mod store;

pub use icons::{FileIcon, icon_for_asset, icon_for_extension};
pub use resource::{Resource, ResourceId};
pub use store::CatalogStore;

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::warn;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Title ordering applied by [`ResourceCatalog::sort`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// Returns the opposite direction.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Primary sort key: decomposed title with combining marks removed, lower-cased.
fn collation_key(title: &str) -> String {
    title
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Accent- and case-insensitive title comparison.
///
/// Ties on the collation key fall back to the raw title, then the id, so the
/// order is total: sorting descending is exactly the reverse of ascending.
#[must_use]
pub fn compare_titles(a: &Resource, b: &Resource) -> Ordering {
    collation_key(&a.title)
        .cmp(&collation_key(&b.title))
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.id.cmp(&b.id))
}

/// Catalog snapshot plus the derived search view.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    entries: Vec<Resource>,
    query: String,
    next_sort: SortDirection,
}

impl ResourceCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole snapshot, keeping the first entry of any duplicated id.
    pub fn replace(&mut self, entries: Vec<Resource>) {
        let mut seen = HashSet::with_capacity(entries.len());
        let total = entries.len();
        self.entries = entries
            .into_iter()
            .filter(|resource| seen.insert(resource.id.clone()))
            .collect();
        if self.entries.len() != total {
            warn!(
                dropped = total - self.entries.len(),
                "Catalog snapshot contained duplicate ids; kept first occurrence"
            );
        }
    }

    /// Removes one entry by id.
    pub fn remove_entry(&mut self, id: &ResourceId) -> Option<Resource> {
        let index = self.entries.iter().position(|resource| &resource.id == id)?;
        Some(self.entries.remove(index))
    }

    /// Sets the search query. Empty matches everything.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Returns the current search query.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Sorts the full snapshot in the pending direction, then flips it.
    ///
    /// Returns the direction that was applied.
    pub fn sort(&mut self) -> SortDirection {
        let applied = self.next_sort;
        match applied {
            SortDirection::Ascending => self.entries.sort_by(compare_titles),
            SortDirection::Descending => self.entries.sort_by(|a, b| compare_titles(b, a)),
        }
        self.next_sort = applied.toggled();
        applied
    }

    /// Direction the next [`sort`](Self::sort) will apply.
    #[must_use]
    pub fn next_sort(&self) -> SortDirection {
        self.next_sort
    }

    /// Full snapshot in stored order.
    #[must_use]
    pub fn entries(&self) -> &[Resource] {
        &self.entries
    }

    /// Entries whose title contains the query, case-insensitively, in stored order.
    #[must_use]
    pub fn filtered(&self) -> Vec<&Resource> {
        let needle = self.query.to_lowercase();
        self.entries
            .iter()
            .filter(|resource| resource.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Looks up an entry by id.
    #[must_use]
    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.entries.iter().find(|resource| &resource.id == id)
    }

    /// Number of entries in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

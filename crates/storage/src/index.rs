//! Secondary index for technical-id lookups
//!
//! The main store is keyed by business key; this index maps each row's
//! `TechnicalId` back to its chain position so `read_by_id` is O(1)
//! instead of a full scan. The index is updated inside the same write
//! lock as the chain data, so it can never disagree with it.

use std::collections::HashMap;

use tempora_core::{BusinessKey, TechnicalId, VersionNumber};

/// Maps TechnicalId → (BusinessKey, VersionNumber)
#[derive(Debug, Default)]
pub struct IdIndex {
    entries: HashMap<TechnicalId, (BusinessKey, VersionNumber)>,
}

impl IdIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a row version under its technical id
    ///
    /// Technical ids are never reused (I4), so an existing entry for `id`
    /// indicates a corrupt write; the caller checks before inserting.
    pub fn insert(&mut self, id: TechnicalId, key: BusinessKey, version: VersionNumber) {
        self.entries.insert(id, (key, version));
    }

    /// Look up the chain position of a technical id
    pub fn get(&self, id: &TechnicalId) -> Option<&(BusinessKey, VersionNumber)> {
        self.entries.get(id)
    }

    /// True if the id is already registered
    pub fn contains(&self, id: &TechnicalId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of indexed rows
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no rows are indexed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! The [CacheIndex] records every committed resource.
//!
//! This is a vec of entries in commit order plus an auxiliary hash-based index from name to the most recent entry with
//! that name.  Nothing is ever evicted: the index only grows.
use std::collections::HashMap;
use std::sync::Arc;

use ahash::RandomState;

use crate::*;

#[derive(Debug, Default)]
pub struct CacheIndex {
    entries: Vec<CacheEntry>,
    /// Points at the latest entry for each name.
    by_name: HashMap<Arc<str>, usize, RandomState>,
    /// Sum of the sizes of everything in `entries`.
    total_bytes: u64,
}

impl CacheIndex {
    pub fn new() -> CacheIndex {
        Default::default()
    }

    /// Append an entry.
    ///
    /// Duplicate names are kept as separate entries; lookups by name see the newest.
    pub fn insert(&mut self, entry: CacheEntry) {
        let ind = self.entries.len();
        self.total_bytes = self.total_bytes.saturating_add(entry.size_bytes());
        self.by_name.insert(entry.shared_name(), ind);
        self.entries.push(entry);
    }

    pub fn get(&self, name: &str) -> Option<&CacheEntry> {
        let ind = *self.by_name.get(name)?;
        Some(&self.entries[ind])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Iterator visiting entries in the order they were committed.
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.iter()
    }
}

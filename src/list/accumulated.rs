//! Append-only, key-deduplicated record list for one filter epoch.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// An item shown in a paginated list, identified by a stable unique key.
pub trait Record {
    type Key: Eq + Hash + Clone + Debug + Send + Sync + 'static;

    fn key(&self) -> Self::Key;
}

/// Ordered concatenation of fetched pages with no repeated keys.
///
/// Records live behind an `Arc` so snapshots share them. A merge copies the
/// vector only while an older snapshot still holds it.
#[derive(Debug, Clone)]
pub struct AccumulatedList<T: Record> {
    records: Arc<Vec<T>>,
    keys: HashSet<T::Key>,
}

impl<T: Record> Default for AccumulatedList<T> {
    fn default() -> Self {
        Self {
            records: Arc::default(),
            keys: HashSet::new(),
        }
    }
}

impl<T: Record + Clone> AccumulatedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the records of a page whose keys are not already present.
    ///
    /// Duplicates inside `page` itself are dropped as well. Returns the number
    /// of records appended.
    pub fn merge(&mut self, page: impl IntoIterator<Item = T>) -> usize {
        let fresh: Vec<T> = page
            .into_iter()
            .filter(|record| self.keys.insert(record.key()))
            .collect();
        let appended = fresh.len();
        if appended > 0 {
            Arc::make_mut(&mut self.records).extend(fresh);
        }
        appended
    }

    pub fn clear(&mut self) {
        self.records = Arc::default();
        self.keys.clear();
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// The records as a shared handle; cloning it does not copy them.
    pub fn shared(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.records)
    }

    pub fn contains_key(&self, key: &T::Key) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

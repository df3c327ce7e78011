//! In-memory skip decisions derived from the tracking document.

use std::collections::HashSet;

use crate::models::{SampleKey, SampleRecord};
use crate::storage::TrackingStore;

/// Filenames and `(author, source_id)` keys already ingested.
#[derive(Debug, Default, Clone)]
pub struct DedupIndex {
    filenames: HashSet<String>,
    keys: HashSet<SampleKey>,
}

impl DedupIndex {
    /// Derive both sets from a loaded store.
    pub fn from_store(store: &TrackingStore) -> Self {
        Self {
            filenames: store.filenames(),
            keys: store.sample_keys(),
        }
    }

    pub fn contains_key(&self, key: &SampleKey) -> bool {
        self.keys.contains(key)
    }

    pub fn contains_filename(&self, full_name: &str) -> bool {
        self.filenames.contains(full_name)
    }

    /// Register a newly ingested sample.
    pub fn insert(&mut self, key: SampleKey, record: &SampleRecord) {
        self.filenames.insert(record.full_name.clone());
        self.keys.insert(key);
    }

    pub fn filename_count(&self) -> usize {
        self.filenames.len()
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

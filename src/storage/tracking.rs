//! Durable tracking document.
//!
//! The document maps a generated sample id to its [`SampleRecord`]:
//!
//! ```text
//! {
//!   "3f2c...": { "full_name": "123__foo__kick.wav", "base_name": "kick" },
//!   ...
//! }
//! ```
//!
//! It is read once at start and rewritten in full at the end of a run, never
//! per item.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::{SampleKey, SampleRecord};

/// In-memory copy of the tracking document.
#[derive(Debug, Clone)]
pub struct TrackingStore {
    path: PathBuf,
    records: BTreeMap<String, SampleRecord>,
}

impl TrackingStore {
    /// An empty store that will be written to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
        }
    }

    /// Read the document at `path`. A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No tracking document at {}, starting empty", path.display());
                return Ok(Self::new(path));
            }
            Err(e) => return Err(AppError::tracking(path.display(), e)),
        };

        let records: BTreeMap<String, SampleRecord> = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::tracking(path.display(), e))?;
        log::info!(
            "Loaded {} tracked samples from {}",
            records.len(),
            path.display()
        );

        Ok(Self { path, records })
    }

    /// Rewrite the whole document atomically (write to temp, then rename).
    pub fn save(&self) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.records)?;
        write_atomic(&self.path, &bytes).map_err(|e| AppError::tracking(self.path.display(), e))?;
        log::info!(
            "Saved {} tracked samples to {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SampleRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = (&String, &SampleRecord)> {
        self.records.iter()
    }

    /// Record a newly ingested sample under its generated id.
    pub fn insert(&mut self, id: impl Into<String>, record: SampleRecord) {
        self.records.insert(id.into(), record);
    }

    /// Every recorded `full_name`.
    pub fn filenames(&self) -> HashSet<String> {
        self.records
            .values()
            .map(|record| record.full_name.clone())
            .collect()
    }

    /// Every `(author, source_id)` key derivable from a recorded name.
    ///
    /// Records whose name does not split into three fields are left out with a
    /// warning; they still count through [`filenames`](Self::filenames).
    pub fn sample_keys(&self) -> HashSet<SampleKey> {
        self.records
            .values()
            .filter_map(|record| match record.key() {
                Ok(key) => Some(key),
                Err(e) => {
                    log::warn!("Unexpected file name in tracking document: {e}");
                    None
                }
            })
            .collect()
    }

    /// Records that cannot contribute a dedup key.
    pub fn degraded(&self) -> Vec<&SampleRecord> {
        self.records
            .values()
            .filter(|record| record.key().is_err())
            .collect()
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension("tmp");
    let mut file = fs::File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)
}

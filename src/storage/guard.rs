//! Deferred flush of the tracking document.

use std::ops::{Deref, DerefMut};

use crate::error::Result;
use crate::storage::TrackingStore;

/// Owns the store for the duration of a run and writes it exactly once.
///
/// Call [`flush`](Self::flush) on the normal exit path to surface write
/// errors. If the guard is dropped unflushed (early return, panic, or a
/// cancelled future) it saves from `Drop` and logs any failure.
#[derive(Debug)]
pub struct FlushGuard {
    store: TrackingStore,
    flushed: bool,
}

impl FlushGuard {
    pub fn new(store: TrackingStore) -> Self {
        Self {
            store,
            flushed: false,
        }
    }

    /// Write the store now. Later calls and the drop are no-ops.
    pub fn flush(&mut self) -> Result<()> {
        if self.flushed {
            return Ok(());
        }
        self.flushed = true;
        self.store.save()
    }
}

impl Deref for FlushGuard {
    type Target = TrackingStore;

    fn deref(&self) -> &TrackingStore {
        &self.store
    }
}

impl DerefMut for FlushGuard {
    fn deref_mut(&mut self) -> &mut TrackingStore {
        &mut self.store
    }
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        if self.flushed {
            return;
        }
        log::warn!("Run ended abnormally, flushing tracking document");
        if let Err(e) = self.flush() {
            log::error!("Failed to flush tracking document: {e}");
        }
    }
}

//! Run bookkeeping and the end-of-run report.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::storage::{DedupIndex, FlushGuard, TrackingStore};

/// Why a run stopped. Every reason is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured download limit was reached
    Limit,
    /// The listing ran out of pages
    EndOfPages,
    /// A binary request returned HTML: the session is not valid
    AuthFailure,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::Limit => "download limit reached",
            StopReason::EndOfPages => "end of pages",
            StopReason::AuthFailure => "authentication failed",
        };
        f.write_str(text)
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub stop: StopReason,
    /// Samples ingested by this run
    pub added: usize,
    /// Candidates skipped as already ingested
    pub skipped: usize,
    /// Detail page URLs whose conversion failed
    pub failed_conversions: Vec<String>,
    /// Records in the tracking document after the run
    pub total_records: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn log(&self) {
        let elapsed = self.finished_at - self.started_at;
        log::info!(
            "Stopped: {}. Added {} samples ({} skipped, {} failed) in {}s; {} tracked in total",
            self.stop,
            self.added,
            self.skipped,
            self.failed_conversions.len(),
            elapsed.num_seconds(),
            self.total_records
        );
        log_failed_conversions(&self.failed_conversions);
    }
}

fn log_failed_conversions(urls: &[String]) {
    if urls.is_empty() {
        return;
    }
    log::warn!("Failed conversion URLs:");
    for url in urls {
        log::warn!("    {url}");
    }
}

/// Mutable state of one run.
///
/// The store sits behind a [`FlushGuard`], so dropping the state without
/// [`finish`](Self::finish) still writes the tracking document and the
/// failure list is still reported.
pub(crate) struct RunState {
    pub store: FlushGuard,
    pub index: DedupIndex,
    pub added: usize,
    pub skipped: usize,
    pub failed_conversions: Vec<String>,
    started_at: DateTime<Utc>,
    finished: bool,
}

impl RunState {
    pub fn start(store: TrackingStore) -> Self {
        let index = DedupIndex::from_store(&store);
        log::info!(
            "Tracking {} samples ({} dedup keys)",
            store.len(),
            index.key_count()
        );

        Self {
            store: FlushGuard::new(store),
            index,
            added: 0,
            skipped: 0,
            failed_conversions: Vec::new(),
            started_at: Utc::now(),
            finished: false,
        }
    }

    /// Flush the store and report, whatever the crawl's outcome.
    pub fn finish(&mut self, outcome: Result<StopReason>) -> Result<RunReport> {
        self.finished = true;
        let flushed = self.store.flush();

        let stop = match outcome {
            Ok(stop) => stop,
            Err(e) => {
                log::error!("Run aborted after {} new samples: {e}", self.added);
                log_failed_conversions(&self.failed_conversions);
                if let Err(flush_err) = flushed {
                    log::error!("Failed to save tracking document: {flush_err}");
                }
                return Err(e);
            }
        };

        let report = RunReport {
            stop,
            added: self.added,
            skipped: self.skipped,
            failed_conversions: std::mem::take(&mut self.failed_conversions),
            total_records: self.store.len(),
            started_at: self.started_at,
            finished_at: Utc::now(),
        };
        report.log();

        flushed?;
        Ok(report)
    }
}

impl Drop for RunState {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        log::warn!("Run interrupted after {} new samples", self.added);
        log_failed_conversions(&self.failed_conversions);
    }
}

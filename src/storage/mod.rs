//! Persistence of what has already been ingested.
//!
//! ## Layout
//!
//! ```text
//! {root}/
//! └── downloads/
//!     ├── downloaded_samples.json   # Tracking document
//!     ├── {full_name}               # Raw staged downloads
//!     └── m4a/
//!         └── {id}.m4a              # Transcoded outputs
//! ```

mod dedup;
mod guard;
mod tracking;

pub use dedup::DedupIndex;
pub use guard::FlushGuard;
pub use tracking::TrackingStore;

//! Pipeline entry points.
//!
//! - `Harvester`: the crawl/dedup/download/convert/record loop
//! - `RunReport`: what a run did and why it stopped

mod harvest;
mod report;

pub use harvest::Harvester;
pub use report::{RunReport, StopReason};

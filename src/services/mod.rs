//! Service layer for the harvester.
//!
//! This module contains the collaborators the pipeline drives:
//! - HTTP transport (`WebClient`, `HttpClient`)
//! - Anchor extraction (`links`)
//! - Listing iteration (`PageWalker`)
//! - Detail/binary resolution (`ItemFetcher`)
//! - Audio conversion (`Transcoder`, `FfmpegTranscoder`)

mod fetcher;
pub mod links;
mod transcoder;
mod walker;
mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::{DownloadOutcome, ItemFetcher};
pub use transcoder::{FfmpegTranscoder, Transcoder};
pub use walker::{PageFetch, PageWalker, extract_candidates};
pub use web::{HttpClient, WebClient, WebResponse};

// src/models/mod.rs

//! Domain models for the harvester.
//!
//! This module contains the configuration tree and the sample types that
//! flow between the crawl, fetch and tracking stages.

mod config;
mod sample;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, ENV_CSRF_TOKEN, ENV_SEARCH_URL, ENV_SESSION_ID, PathsConfig,
    SessionConfig, SourceConfig, TranscoderConfig,
};
pub use sample::{
    CandidateLink, DownloadLink, NAME_SEPARATOR, SampleKey, SampleName, SampleRecord, base_name,
};

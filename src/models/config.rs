//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Environment variable holding the session cookie value.
pub const ENV_SESSION_ID: &str = "SESSIONID";
/// Environment variable holding the CSRF cookie value.
pub const ENV_CSRF_TOKEN: &str = "CSRFTOKEN";
/// Environment variable overriding `source.search_url`.
pub const ENV_SEARCH_URL: &str = "SEARCH_URL";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where to crawl and how far
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Session credentials, normally supplied through the environment
    #[serde(default, skip_serializing)]
    pub session: SessionConfig,

    /// Filesystem layout
    #[serde(default)]
    pub paths: PathsConfig,

    /// External transcoder invocation
    #[serde(default)]
    pub transcoder: TranscoderConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary variable lookup.
    ///
    /// Empty values are ignored so a blank line in `.env` does not erase a
    /// value set elsewhere.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get(ENV_SESSION_ID) {
            self.session.session_id = Some(value);
        }
        if let Some(value) = get(ENV_CSRF_TOKEN) {
            self.session.csrf_token = Some(value);
        }
        if let Some(value) = get(ENV_SEARCH_URL) {
            self.source.search_url = value;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.search_url.trim().is_empty() {
            return Err(AppError::validation(format!(
                "source.search_url is empty (set it or {ENV_SEARCH_URL})"
            )));
        }
        Url::parse(&self.source.search_url)
            .map_err(|e| AppError::validation(format!("source.search_url: {e}")))?;
        Url::parse(&self.source.site_url)
            .map_err(|e| AppError::validation(format!("source.site_url: {e}")))?;
        if self.source.start_page == 0 {
            return Err(AppError::validation("source.start_page must be >= 1"));
        }
        if self.source.max_downloads == Some(0) {
            return Err(AppError::validation(
                "source.max_downloads must be > 0 when set",
            ));
        }
        if self.session.session_id.is_none() {
            return Err(AppError::validation(format!(
                "session id missing (set {ENV_SESSION_ID})"
            )));
        }
        if self.session.csrf_token.is_none() {
            return Err(AppError::validation(format!(
                "csrf token missing (set {ENV_CSRF_TOKEN})"
            )));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == Some(0) {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }

        let t = &self.transcoder;
        for (name, value) in [
            ("program", &t.program),
            ("audio_codec", &t.audio_codec),
            ("bitrate", &t.bitrate),
            ("extension", &t.extension),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("transcoder.{name} is empty")));
            }
        }
        Ok(())
    }
}

/// Listing source and crawl bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Site origin used to resolve relative links
    #[serde(default = "defaults::site_url")]
    pub site_url: String,

    /// First page of the search results listing
    #[serde(default)]
    pub search_url: String,

    /// Page number to start from
    #[serde(default = "defaults::start_page")]
    pub start_page: u32,

    /// Stop after this many successful ingestions
    #[serde(default)]
    pub max_downloads: Option<usize>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            site_url: defaults::site_url(),
            search_url: String::new(),
            start_page: defaults::start_page(),
            max_downloads: None,
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Delay after each successful ingestion in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Request timeout in seconds; the transport default when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            request_delay_ms: defaults::request_delay(),
            timeout_secs: None,
        }
    }
}

/// Session cookie values.
#[derive(Clone, Default, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub session_id: Option<String>,

    #[serde(default)]
    pub csrf_token: Option<String>,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("SessionConfig")
            .field("session_id", &redact(&self.session_id))
            .field("csrf_token", &redact(&self.csrf_token))
            .finish()
    }
}

/// Filesystem layout, relative to `root_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::root_dir")]
    pub root_dir: PathBuf,

    /// Raw downloads, stored under their served filename
    #[serde(default = "defaults::downloads_dir")]
    pub downloads_dir: String,

    /// Transcoded outputs, inside the downloads directory
    #[serde(default = "defaults::converted_dir")]
    pub converted_dir: String,

    /// Tracking document, inside the downloads directory
    #[serde(default = "defaults::tracking_file")]
    pub tracking_file: String,
}

impl PathsConfig {
    pub fn downloads_path(&self) -> PathBuf {
        self.root_dir.join(&self.downloads_dir)
    }

    pub fn converted_path(&self) -> PathBuf {
        self.downloads_path().join(&self.converted_dir)
    }

    pub fn tracking_path(&self) -> PathBuf {
        self.downloads_path().join(&self.tracking_file)
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            root_dir: defaults::root_dir(),
            downloads_dir: defaults::downloads_dir(),
            converted_dir: defaults::converted_dir(),
            tracking_file: defaults::tracking_file(),
        }
    }
}

/// External transcoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscoderConfig {
    #[serde(default = "defaults::program")]
    pub program: String,

    #[serde(default = "defaults::audio_codec")]
    pub audio_codec: String,

    #[serde(default = "defaults::bitrate")]
    pub bitrate: String,

    /// Container extension of the converted files
    #[serde(default = "defaults::extension")]
    pub extension: String,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            program: defaults::program(),
            audio_codec: defaults::audio_codec(),
            bitrate: defaults::bitrate(),
            extension: defaults::extension(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Source defaults
    pub fn site_url() -> String {
        "https://freesound.org".into()
    }
    pub fn start_page() -> u32 {
        1
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; harvester/0.1)".into()
    }
    pub fn request_delay() -> u64 {
        1000
    }

    // Path defaults
    pub fn root_dir() -> PathBuf {
        PathBuf::from(".")
    }
    pub fn downloads_dir() -> String {
        "downloads".into()
    }
    pub fn converted_dir() -> String {
        "m4a".into()
    }
    pub fn tracking_file() -> String {
        "downloaded_samples.json".into()
    }

    // Transcoder defaults
    pub fn program() -> String {
        "ffmpeg".into()
    }
    pub fn audio_codec() -> String {
        "aac".into()
    }
    pub fn bitrate() -> String {
        "128k".into()
    }
    pub fn extension() -> String {
        "m4a".into()
    }
}

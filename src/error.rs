// src/error.rs

//! Unified error handling for the harvester.

use std::fmt;

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Tracking document could not be read or written
    #[error("Tracking store error at {path}: {message}")]
    Tracking { path: String, message: String },

    /// Fetching an item failed
    #[error("Fetch error for {context}: {message}")]
    Fetch { context: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a tracking store error for the given document path.
    pub fn tracking(path: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Tracking {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a fetch error with context.
    pub fn fetch(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            context: context.into(),
            message: message.to_string(),
        }
    }
}

/// Failure to split a served path or filename into its sample fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// A fixed path marker was missing or in the wrong position
    #[error("expected '{expected}' segment in '{path}'")]
    MissingMarker { path: String, expected: &'static str },

    /// A required segment was absent or empty
    #[error("missing {field} in '{path}'")]
    MissingField { path: String, field: &'static str },

    /// A filename did not split into `{source_id}__{author}__{title}`
    #[error("'{name}' has {parts} '__'-separated parts, expected 3")]
    SegmentCount { name: String, parts: usize },
}

/// Failure of the external transcoding process.
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// The process could not be started
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited with a non-zero status
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The process reported success but produced nothing
    #[error("output file {0} was not produced")]
    MissingOutput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_error_message() {
        let err = AppError::tracking("downloads/samples.json", "permission denied");
        assert_eq!(
            err.to_string(),
            "Tracking store error at downloads/samples.json: permission denied"
        );
    }

    #[test]
    fn test_segment_count_message() {
        let err = PathParseError::SegmentCount {
            name: "kick.wav".to_string(),
            parts: 1,
        };
        assert_eq!(
            err.to_string(),
            "'kick.wav' has 1 '__'-separated parts, expected 3"
        );
    }
}

//! In-memory collaborators for tests.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::{AppError, Result, TranscodeError};
use crate::services::{Transcoder, WebClient, WebResponse};

/// Canned responses keyed by exact URL. Unknown URLs refuse the connection.
#[derive(Default)]
pub struct FakeWeb {
    routes: HashMap<String, WebResponse>,
    requests: Mutex<Vec<String>>,
}

impl FakeWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn html(mut self, url: &str, body: &str) -> Self {
        self.routes.insert(
            url.to_string(),
            WebResponse {
                status: 200,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body: body.as_bytes().to_vec(),
            },
        );
        self
    }

    pub fn binary(mut self, url: &str, bytes: &[u8]) -> Self {
        self.routes.insert(
            url.to_string(),
            WebResponse {
                status: 200,
                content_type: Some("audio/wav".to_string()),
                body: bytes.to_vec(),
            },
        );
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(
            url.to_string(),
            WebResponse {
                status,
                content_type: Some("application/octet-stream".to_string()),
                body: Vec::new(),
            },
        );
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl WebClient for FakeWeb {
    async fn get(&self, url: &str) -> Result<WebResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        self.routes
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::fetch(url, "connection refused"))
    }
}

/// Copies input to output, failing for inputs whose file name is listed.
///
/// A stalling input signals its [`Notify`] and never completes.
#[derive(Default)]
pub struct FakeTranscoder {
    failing: HashSet<String>,
    stalling: HashMap<String, Arc<Notify>>,
    calls: Mutex<usize>,
}

impl FakeTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(mut self, file_name: &str) -> Self {
        self.failing.insert(file_name.to_string());
        self
    }

    pub fn stalling_on(mut self, file_name: &str, started: Arc<Notify>) -> Self {
        self.stalling.insert(file_name.to_string(), started);
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
    ) -> std::result::Result<(), TranscodeError> {
        *self.calls.lock().unwrap() += 1;

        let name = input
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if let Some(started) = self.stalling.get(name) {
            started.notify_one();
            std::future::pending::<()>().await;
        }
        if self.failing.contains(name) {
            return Err(TranscodeError::Failed {
                program: "fake".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }

        let bytes = tokio::fs::read(input)
            .await
            .map_err(|source| TranscodeError::Spawn {
                program: "fake".to_string(),
                source,
            })?;
        tokio::fs::write(output, bytes)
            .await
            .map_err(|source| TranscodeError::Spawn {
                program: "fake".to_string(),
                source,
            })?;
        Ok(())
    }
}

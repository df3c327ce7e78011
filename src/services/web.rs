//! Outbound HTTP seam.
//!
//! The crawl only ever issues GET requests carrying the session cookies, so
//! the transport is reduced to [`WebClient::get`]. An `Err` means the request
//! never produced a response (connection refused, reset, timeout); HTTP error
//! statuses come back as a normal [`WebResponse`].

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;

use crate::error::Result;
use crate::models::Config;
use crate::utils::http;

/// Status, content type and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl WebResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the server answered with an HTML document.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/html"))
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Session-authenticated GET.
#[async_trait]
pub trait WebClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<WebResponse>;
}

/// [`WebClient`] backed by reqwest with a session cookie jar.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config)?,
        })
    }
}

#[async_trait]
impl WebClient for HttpClient {
    async fn get(&self, url: &str) -> Result<WebResponse> {
        log::debug!("GET {url}");
        let response = self.client.get(url).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(WebResponse {
            status,
            content_type,
            body,
        })
    }
}

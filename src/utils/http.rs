// src/utils/http.rs

//! HTTP client utilities.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Config;

/// Cookie name carrying the session id.
pub const SESSION_COOKIE: &str = "sessionid";
/// Cookie name carrying the CSRF token.
pub const CSRF_COOKIE: &str = "csrftoken";

/// Build a cookie jar holding the session credentials for every origin the
/// crawl talks to.
pub fn session_jar(config: &Config) -> Result<Jar> {
    let session_id = config
        .session
        .session_id
        .as_deref()
        .ok_or_else(|| AppError::config("session id is not set"))?;
    let csrf_token = config
        .session
        .csrf_token
        .as_deref()
        .ok_or_else(|| AppError::config("csrf token is not set"))?;

    let jar = Jar::default();
    let mut origins: Vec<Url> = Vec::new();
    for raw in [&config.source.site_url, &config.source.search_url] {
        let url = Url::parse(raw)?;
        if !origins.iter().any(|o| o.origin() == url.origin()) {
            origins.push(url);
        }
    }

    for origin in &origins {
        jar.add_cookie_str(&format!("{SESSION_COOKIE}={session_id}; Path=/"), origin);
        jar.add_cookie_str(&format!("{CSRF_COOKIE}={csrf_token}; Path=/"), origin);
    }
    Ok(jar)
}

/// Create a configured asynchronous HTTP client carrying the session cookies.
pub fn create_async_client(config: &Config) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(&config.crawler.user_agent)
        .cookie_provider(Arc::new(session_jar(config)?));

    if let Some(secs) = config.crawler.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_jar_requires_credentials() {
        let mut config = Config::default();
        config.source.search_url = "https://example.com/search/".to_string();
        assert!(matches!(session_jar(&config), Err(AppError::Config(_))));
    }
}

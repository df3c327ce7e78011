//! Utility functions and helpers.

pub mod http;
pub mod signal;

pub use signal::shutdown_signal;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// URL of listing page `page`.
///
/// Page 1 is the bare search URL; later pages append a `page` query pair.
pub fn page_url(search_url: &Url, page: u32) -> String {
    if page <= 1 {
        return search_url.to_string();
    }
    let mut url = search_url.clone();
    url.query_pairs_mut().append_pair("page", &page.to_string());
    url.to_string()
}

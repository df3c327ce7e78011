//! Listing page iteration.

use std::collections::HashSet;

use url::Url;

use crate::error::{AppError, Result};
use crate::models::CandidateLink;
use crate::services::{WebClient, links};
use crate::utils::page_url;

/// Outcome of fetching one listing page.
#[derive(Debug)]
pub enum PageFetch {
    /// Candidate links in listing order
    Page(Vec<CandidateLink>),
    /// An error status or a page without candidates
    EndOfPages,
    /// The request never produced a response
    TransportError(AppError),
}

/// Walks listing pages upward from a starting page.
pub struct PageWalker<'a> {
    client: &'a dyn WebClient,
    search_url: Url,
    page: u32,
}

impl<'a> PageWalker<'a> {
    pub fn new(client: &'a dyn WebClient, search_url: &str, start_page: u32) -> Result<Self> {
        Ok(Self {
            client,
            search_url: Url::parse(search_url)?,
            page: start_page.max(1),
        })
    }

    /// Current page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn current_url(&self) -> String {
        page_url(&self.search_url, self.page)
    }

    /// Move to the next page.
    pub fn advance(&mut self) {
        self.page += 1;
    }

    /// Fetch the current page and extract its candidate links.
    pub async fn fetch(&self) -> PageFetch {
        let url = self.current_url();
        let response = match self.client.get(&url).await {
            Ok(response) => response,
            Err(e) => return PageFetch::TransportError(e),
        };

        if !response.is_success() {
            log::info!("Page {} answered HTTP {}", self.page, response.status);
            return PageFetch::EndOfPages;
        }

        match extract_candidates(&response.text()) {
            Ok(candidates) if candidates.is_empty() => PageFetch::EndOfPages,
            Ok(candidates) => PageFetch::Page(candidates),
            Err(e) => PageFetch::TransportError(e),
        }
    }
}

/// Candidate links of a listing document, first occurrence order, without
/// repeats.
pub fn extract_candidates(body: &str) -> Result<Vec<CandidateLink>> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for href in links::find_links(body, CandidateLink::matches)? {
        match CandidateLink::parse(&href) {
            Ok(candidate) => {
                if seen.insert(candidate.key()) {
                    candidates.push(candidate);
                }
            }
            Err(e) => log::debug!("Ignoring listing link: {e}"),
        }
    }
    Ok(candidates)
}

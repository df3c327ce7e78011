//! Per-sample detail page resolution and binary download.

use url::Url;

use crate::error::Result;
use crate::models::{CandidateLink, DownloadLink};
use crate::services::{WebClient, links};
use crate::storage::DedupIndex;
use crate::utils::resolve_url;

/// Classification of one fetch attempt.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The sample's raw bytes
    Binary { bytes: Vec<u8>, link: DownloadLink },
    /// HTML came back instead of audio: the session is not valid
    AuthFailure,
    /// The detail page has no usable download anchor
    NoDownloadLink,
    /// The download link names a sample that is already tracked
    AlreadyIngested(DownloadLink),
    /// The binary request answered with an error status
    Unavailable { link: DownloadLink, status: u16 },
}

/// Resolves candidates to downloads.
pub struct ItemFetcher<'a> {
    client: &'a dyn WebClient,
    site_url: Url,
}

impl<'a> ItemFetcher<'a> {
    pub fn new(client: &'a dyn WebClient, site_url: &str) -> Result<Self> {
        Ok(Self {
            client,
            site_url: Url::parse(site_url)?,
        })
    }

    /// Absolute URL of a candidate's detail page.
    pub fn detail_url(&self, candidate: &CandidateLink) -> String {
        resolve_url(&self.site_url, &candidate.href)
    }

    /// Fetch the detail page, then the binary unless `index` already knows it.
    ///
    /// Transport errors propagate; everything the site can answer is
    /// classified into a [`DownloadOutcome`].
    pub async fn fetch(
        &self,
        candidate: &CandidateLink,
        index: &DedupIndex,
    ) -> Result<DownloadOutcome> {
        let detail_url = self.detail_url(candidate);
        let detail = self.client.get(&detail_url).await?;

        let Some(href) = links::find_first_link(&detail.text(), DownloadLink::matches)? else {
            log::warn!("No download link found on {detail_url}");
            return Ok(DownloadOutcome::NoDownloadLink);
        };
        let link = match DownloadLink::parse(&href) {
            Ok(link) => link,
            Err(e) => {
                log::warn!("Unusable download link on {detail_url}: {e}");
                return Ok(DownloadOutcome::NoDownloadLink);
            }
        };

        if index.contains_filename(&link.full_name) || index.contains_key(&link.key()) {
            return Ok(DownloadOutcome::AlreadyIngested(link));
        }

        let response = self
            .client
            .get(&resolve_url(&self.site_url, &link.href))
            .await?;

        if response.is_html() {
            return Ok(DownloadOutcome::AuthFailure);
        }
        if !response.is_success() {
            return Ok(DownloadOutcome::Unavailable {
                status: response.status,
                link,
            });
        }

        Ok(DownloadOutcome::Binary {
            bytes: response.body,
            link,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SampleKey, SampleRecord};
    use crate::services::testing::FakeWeb;

    const SITE: &str = "https://example.com";
    const DETAIL: &str = "https://example.com/people/foo/sounds/123/";
    const BINARY: &str = "https://example.com/people/foo/sounds/123/download/123__foo__kick.wav";

    fn candidate() -> CandidateLink {
        CandidateLink::parse("/people/foo/sounds/123/").unwrap()
    }

    fn detail_page() -> String {
        r#"<a href="/people/foo/">foo</a>
           <a href="/people/foo/sounds/123/download/123__foo__kick.wav">Download</a>"#
            .to_string()
    }

    #[tokio::test]
    async fn test_fetch_binary() {
        let web = FakeWeb::new()
            .html(DETAIL, &detail_page())
            .binary(BINARY, b"RIFF");
        let fetcher = ItemFetcher::new(&web, SITE).unwrap();

        match fetcher.fetch(&candidate(), &DedupIndex::default()).await.unwrap() {
            DownloadOutcome::Binary { bytes, link } => {
                assert_eq!(bytes, b"RIFF");
                assert_eq!(link.full_name, "123__foo__kick.wav");
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_html_binary_is_auth_failure() {
        let web = FakeWeb::new()
            .html(DETAIL, &detail_page())
            .html(BINARY, "<html>Please log in</html>");
        let fetcher = ItemFetcher::new(&web, SITE).unwrap();

        let outcome = fetcher.fetch(&candidate(), &DedupIndex::default()).await.unwrap();
        assert!(matches!(outcome, DownloadOutcome::AuthFailure));
    }

    #[tokio::test]
    async fn test_missing_download_link() {
        let web = FakeWeb::new().html(DETAIL, "<a href=\"/people/foo/\">foo</a>");
        let fetcher = ItemFetcher::new(&web, SITE).unwrap();

        let outcome = fetcher.fetch(&candidate(), &DedupIndex::default()).await.unwrap();
        assert!(matches!(outcome, DownloadOutcome::NoDownloadLink));
        assert_eq!(web.requests(), vec![DETAIL.to_string()]);
    }

    #[tokio::test]
    async fn test_known_filename_skips_binary() {
        let web = FakeWeb::new().html(DETAIL, &detail_page());
        let fetcher = ItemFetcher::new(&web, SITE).unwrap();

        let mut index = DedupIndex::default();
        index.insert(
            SampleKey::new("someone-else", "999"),
            &SampleRecord {
                full_name: "123__foo__kick.wav".to_string(),
                base_name: "kick".to_string(),
            },
        );

        let outcome = fetcher.fetch(&candidate(), &index).await.unwrap();
        assert!(matches!(outcome, DownloadOutcome::AlreadyIngested(_)));
        assert_eq!(web.request_count(BINARY), 0);
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let web = FakeWeb::new()
            .html(DETAIL, &detail_page())
            .status(BINARY, 404);
        let fetcher = ItemFetcher::new(&web, SITE).unwrap();

        let outcome = fetcher.fetch(&candidate(), &DedupIndex::default()).await.unwrap();
        assert!(matches!(outcome, DownloadOutcome::Unavailable { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_detail_transport_error_propagates() {
        let web = FakeWeb::new();
        let fetcher = ItemFetcher::new(&web, SITE).unwrap();
        assert!(fetcher.fetch(&candidate(), &DedupIndex::default()).await.is_err());
    }
}

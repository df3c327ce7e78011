// src/pipeline/harvest.rs

//! Ingestion pipeline.
//!
//! Walks listing pages and, for each candidate in order:
//!
//! 1. stops if the download limit is reached
//! 2. skips if its `(author, source_id)` is already tracked (no request made)
//! 3. resolves the detail page's download link, skipping if absent
//! 4. skips if the served filename or its key is already tracked
//! 5. downloads the binary, stopping the whole run on an HTML answer
//! 6. stages the raw file under its served name
//! 7. transcodes to `{id}.{ext}`; a failure is recorded and skipped
//! 8. records the sample and waits before the next candidate
//!
//! The tracking document is flushed once when the run stops, on every exit
//! path.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::error::Result;
use crate::models::{CandidateLink, Config, DownloadLink, SampleRecord};
use crate::pipeline::report::{RunReport, RunState, StopReason};
use crate::services::{
    DownloadOutcome, ItemFetcher, PageFetch, PageWalker, Transcoder, WebClient,
};
use crate::storage::TrackingStore;

/// What to do after one candidate.
enum Step {
    Next,
    Stop(StopReason),
}

/// Sequential crawl, fetch, convert and record loop.
pub struct Harvester {
    config: Arc<Config>,
    client: Arc<dyn WebClient>,
    transcoder: Arc<dyn Transcoder>,
}

impl Harvester {
    pub fn new(
        config: Arc<Config>,
        client: Arc<dyn WebClient>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        Self {
            config,
            client,
            transcoder,
        }
    }

    /// Run until a stop condition, then flush `store` and report.
    pub async fn run(&self, store: TrackingStore) -> Result<RunReport> {
        let mut state = RunState::start(store);
        let outcome = self.crawl(&mut state).await;
        state.finish(outcome)
    }

    /// Run until a stop condition or until `shutdown` completes.
    ///
    /// On shutdown the run is abandoned between awaits and `None` is
    /// returned; the records ingested so far are flushed before returning.
    pub async fn run_until(
        &self,
        store: TrackingStore,
        shutdown: impl Future<Output = ()>,
    ) -> Result<Option<RunReport>> {
        tokio::select! {
            result = self.run(store) => result.map(Some),
            () = shutdown => Ok(None),
        }
    }

    async fn crawl(&self, state: &mut RunState) -> Result<StopReason> {
        let source = &self.config.source;
        let mut walker = PageWalker::new(
            self.client.as_ref(),
            &source.search_url,
            source.start_page,
        )?;
        let fetcher = ItemFetcher::new(self.client.as_ref(), &source.site_url)?;

        loop {
            if self.limit_reached(state) {
                return Ok(StopReason::Limit);
            }

            log::info!("Fetching page {}", walker.page());
            let candidates = match walker.fetch().await {
                PageFetch::Page(candidates) => candidates,
                PageFetch::EndOfPages => {
                    log::info!("No sample links on page {}, end of pages", walker.page());
                    return Ok(StopReason::EndOfPages);
                }
                PageFetch::TransportError(e) => {
                    log::info!("No more pages after page {}: {e}", walker.page());
                    return Ok(StopReason::EndOfPages);
                }
            };
            log::debug!(
                "Page {} lists {} candidates",
                walker.page(),
                candidates.len()
            );

            for candidate in &candidates {
                if let Step::Stop(reason) =
                    self.process(candidate, &fetcher, state, walker.page()).await?
                {
                    return Ok(reason);
                }
            }

            walker.advance();
        }
    }

    async fn process(
        &self,
        candidate: &CandidateLink,
        fetcher: &ItemFetcher<'_>,
        state: &mut RunState,
        page: u32,
    ) -> Result<Step> {
        if self.limit_reached(state) {
            log::info!("Reached download limit of {}", state.added);
            return Ok(Step::Stop(StopReason::Limit));
        }

        if state.index.contains_key(&candidate.key()) {
            log::info!(
                "Skipping {} by {} - already downloaded",
                candidate.source_id,
                candidate.author
            );
            state.skipped += 1;
            return Ok(Step::Next);
        }

        let detail_url = fetcher.detail_url(candidate);
        match fetcher.fetch(candidate, &state.index).await? {
            DownloadOutcome::Binary { bytes, link } => {
                self.ingest(&bytes, &link, &detail_url, state, page).await
            }
            DownloadOutcome::AuthFailure => {
                log::error!(
                    "Got HTML instead of audio from {detail_url} - authentication failed! \
                     Check the session credentials."
                );
                Ok(Step::Stop(StopReason::AuthFailure))
            }
            DownloadOutcome::NoDownloadLink => Ok(Step::Next),
            DownloadOutcome::AlreadyIngested(link) => {
                log::info!("Skipping {} - already downloaded", link.full_name);
                state.skipped += 1;
                Ok(Step::Next)
            }
            DownloadOutcome::Unavailable { link, status } => {
                log::warn!("Download of {} answered HTTP {status}", link.full_name);
                Ok(Step::Next)
            }
        }
    }

    async fn ingest(
        &self,
        bytes: &[u8],
        link: &DownloadLink,
        detail_url: &str,
        state: &mut RunState,
        page: u32,
    ) -> Result<Step> {
        let paths = &self.config.paths;

        let downloads_dir = paths.downloads_path();
        tokio::fs::create_dir_all(&downloads_dir).await?;
        let staged = downloads_dir.join(&link.full_name);
        tokio::fs::write(&staged, bytes).await?;

        let id = Uuid::new_v4().to_string();
        let converted_dir = paths.converted_path();
        tokio::fs::create_dir_all(&converted_dir).await?;
        let output =
            converted_dir.join(format!("{id}.{}", self.config.transcoder.extension));

        if let Err(e) = self.transcoder.transcode(&staged, &output).await {
            log::warn!("Conversion failed for {}: {e}", link.full_name);
            state.failed_conversions.push(detail_url.to_string());
            return Ok(Step::Next);
        }

        let record = SampleRecord::from_download(link);
        state.index.insert(link.key(), &record);
        state.store.insert(id, record);
        state.added += 1;
        log::info!(
            "(#{} on p{}) Done with file {}",
            state.added,
            page,
            link.full_name
        );

        let delay = Duration::from_millis(self.config.crawler.request_delay_ms);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(Step::Next)
    }

    fn limit_reached(&self, state: &RunState) -> bool {
        self.config
            .source
            .max_downloads
            .is_some_and(|max| state.added >= max)
    }
}

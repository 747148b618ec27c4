use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::DiscoveryConfig;
use crate::errors::ProviderError;
use crate::models::{SearchOutcome, SearchQuery, VideoRecord, PROVIDER_PAGE_SIZE};
use crate::services::enricher::MetricEnricher;
use crate::services::youtube::VideoProvider;

/// Drives keyword search page by page. Each call to [`SearchPaginator::search`]
/// owns its accumulator and seen-set; provider calls run strictly in order.
pub struct SearchPaginator<'a> {
    provider: &'a dyn VideoProvider,
    config: &'a DiscoveryConfig,
    cancel: Option<Arc<AtomicBool>>,
}

struct PageResult {
    hits: usize,
    accepted: usize,
    next_page_token: Option<String>,
}

impl<'a> SearchPaginator<'a> {
    pub fn new(provider: &'a dyn VideoProvider, config: &'a DiscoveryConfig) -> Self {
        Self {
            provider,
            config,
            cancel: None,
        }
    }

    /// Checked before each page request; a page already in flight completes.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Quota exhaustion ends the run with whatever was gathered and the
    /// `quota_exceeded` flag set. Any other provider error discards the
    /// partial result and is returned as is.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchOutcome, ProviderError> {
        let enricher = MetricEnricher::new(self.provider, self.config.short_threshold_secs);
        let target = query.target_count();

        let mut outcome = SearchOutcome::default();
        let mut records: Vec<VideoRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut page_token: Option<String> = None;

        info!("Starting search for {:?} (target {target})", query.keyword());

        while records.len() < target {
            if outcome.pages_fetched >= self.config.max_page_iterations {
                warn!(
                    "Stopping search for {:?} after {} pages with {}/{target} results",
                    query.keyword(),
                    outcome.pages_fetched,
                    records.len()
                );
                outcome.page_limit_reached = true;
                break;
            }
            if self.is_cancelled() {
                info!("Search for {:?} cancelled", query.keyword());
                outcome.cancelled = true;
                break;
            }

            let page_size = PROVIDER_PAGE_SIZE.min(target - records.len());
            let page = self
                .fetch_page(&enricher, query, page_token.as_deref(), page_size, &mut seen, &mut records)
                .await;

            match page {
                Ok(page) => {
                    outcome.pages_fetched += 1;
                    debug!(
                        "Page {}: {} hits, {} accepted, {} total",
                        outcome.pages_fetched,
                        page.hits,
                        page.accepted,
                        records.len()
                    );
                    if page.hits == 0 {
                        break;
                    }
                    page_token = page.next_page_token;
                    if page_token.is_none() {
                        break;
                    }
                }
                Err(ProviderError::QuotaExceeded(message)) => {
                    warn!(
                        "Quota exceeded during search for {:?}, returning {} results: {message}",
                        query.keyword(),
                        records.len()
                    );
                    outcome.quota_exceeded = true;
                    break;
                }
                Err(e) => {
                    error!("Search for {:?} failed: {e}", query.keyword());
                    return Err(e);
                }
            }
        }

        records.truncate(target);
        outcome.records = records;
        info!(
            "Search for {:?} finished with {} results over {} pages",
            query.keyword(),
            outcome.records.len(),
            outcome.pages_fetched
        );
        Ok(outcome)
    }

    /// Records are only appended after every call for the page succeeded.
    async fn fetch_page(
        &self,
        enricher: &MetricEnricher<'_>,
        query: &SearchQuery,
        page_token: Option<&str>,
        page_size: usize,
        seen: &mut HashSet<String>,
        records: &mut Vec<VideoRecord>,
    ) -> Result<PageResult, ProviderError> {
        let page = self.provider.search_page(query, page_token, page_size).await?;
        if page.hits.is_empty() {
            return Ok(PageResult {
                hits: 0,
                accepted: 0,
                next_page_token: None,
            });
        }

        let mut channel_ids: Vec<String> = Vec::new();
        for hit in &page.hits {
            if !hit.channel_id.is_empty() && !channel_ids.contains(&hit.channel_id) {
                channel_ids.push(hit.channel_id.clone());
            }
        }
        let video_ids: Vec<String> = page.hits.iter().map(|hit| hit.video_id.clone()).collect();

        let channel_stats = enricher.resolve_channel_stats(&channel_ids).await?;
        let video_stats = enricher.resolve_video_stats(&video_ids).await?;

        let mut accepted = 0;
        for hit in &page.hits {
            if seen.contains(&hit.video_id) {
                debug!("Dropping duplicate video {}", hit.video_id);
                continue;
            }
            let Some(video) = video_stats.get(&hit.video_id) else {
                debug!("No statistics returned for video {}, skipping", hit.video_id);
                continue;
            };

            let record = enricher.score_video(video, channel_stats.get(&video.channel_id));
            if !passes_filters(query, &record) {
                continue;
            }

            seen.insert(record.video_id.clone());
            records.push(record);
            accepted += 1;
        }

        Ok(PageResult {
            hits: page.hits.len(),
            accepted,
            next_page_token: page.next_page_token,
        })
    }
}

fn passes_filters(query: &SearchQuery, record: &VideoRecord) -> bool {
    record.view_count >= query.min_view_count()
        && record.subscriber_count >= query.min_subscriber_count()
        && query.duration_filter().accepts(record.is_short)
}

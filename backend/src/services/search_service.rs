use log::{error, info};

use crate::config::DiscoveryConfig;
use crate::errors::{ProviderError, SearchError};
use crate::models::{ApiKeyCheck, SearchOutcome, SearchQuery, SearchResponse, UsageKind};
use crate::services::paginator::SearchPaginator;
use crate::services::search_cache::SearchCache;
use crate::services::selection::SelectionStore;
use crate::services::usage::UsageTracker;
use crate::services::youtube::VideoProvider;

pub const QUOTA_MESSAGE: &str =
    "YouTube API daily quota exhausted. Showing the results gathered so far; the quota resets at midnight Pacific Time.";
pub const PAGE_LIMIT_MESSAGE: &str =
    "Stopped after the maximum number of result pages. Loosen the filters to find more videos.";

/// Serves the query from cache when possible, otherwise spends one unit of
/// the daily search allowance, runs the paginator and caches complete
/// outcomes. The flag tells whether the cache answered.
pub async fn cached_search(
    provider: &dyn VideoProvider,
    config: &DiscoveryConfig,
    cache: &SearchCache,
    usage: &UsageTracker,
    query: &SearchQuery,
) -> Result<(SearchOutcome, bool), SearchError> {
    if let Some(outcome) = cache.get(query) {
        info!("Serving {:?} from search cache", query.keyword());
        return Ok((outcome, true));
    }

    usage.try_consume(UsageKind::Search)?;
    let outcome = SearchPaginator::new(provider, config).search(query).await?;
    cache.insert(query.clone(), outcome.clone());
    Ok((outcome, false))
}

pub fn build_search_response(
    outcome: SearchOutcome,
    cached: bool,
    selection: &SelectionStore,
) -> SearchResponse {
    let message = if outcome.quota_exceeded {
        Some(QUOTA_MESSAGE.to_string())
    } else if outcome.page_limit_reached {
        Some(PAGE_LIMIT_MESSAGE.to_string())
    } else {
        None
    };

    SearchResponse {
        results: selection.rows(&outcome.records),
        total: outcome.records.len(),
        quota_exceeded: outcome.quota_exceeded,
        page_limit_reached: outcome.page_limit_reached,
        cached,
        message,
    }
}

/// Issues the cheapest possible search to see whether the configured key works.
pub async fn check_api_key(provider: &dyn VideoProvider) -> ApiKeyCheck {
    let sample = match SearchQuery::new("test", 1) {
        Ok(query) => query,
        Err(e) => {
            return ApiKeyCheck {
                ok: false,
                message: e.to_string(),
            }
        }
    };

    match provider.search_page(&sample, None, 1).await {
        Ok(_) => ApiKeyCheck {
            ok: true,
            message: "Connected to the YouTube Data API".to_string(),
        },
        Err(e) => {
            error!("API key check failed: {e}");
            let message = match &e {
                ProviderError::QuotaExceeded(_) | ProviderError::Api { status: 403, .. } => {
                    "Connection failed: quota exceeded or permission denied".to_string()
                }
                ProviderError::Api { status, .. } => {
                    format!("Connection failed (code {status})")
                }
                ProviderError::MissingApiKey => "No API key configured".to_string(),
                other => format!("Connection failed: {other}"),
            };
            ApiKeyCheck { ok: false, message }
        }
    }
}

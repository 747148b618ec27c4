#[macro_use]
extern crate rocket;

pub mod api;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::DiscoveryConfig;
use crate::services::rate_limiter::RateLimiter;
use crate::services::search_cache::SearchCache;
use crate::services::selection::SelectionStore;
use crate::services::state_store::StateStore;
use crate::services::transcript::{TranscriptService, TranscriptSource};
use crate::services::usage::{UsageLimits, UsageTracker};
use crate::services::youtube::VideoProvider;
use log::{error, info};
use rocket::{Build, Rocket};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::JobScheduler;

pub struct AppState {
    pub provider: Arc<dyn VideoProvider>,
    pub config: DiscoveryConfig,
    pub cache: Arc<SearchCache>,
    pub selection: Arc<SelectionStore>,
    pub state_store: Arc<dyn StateStore>,
    pub usage: Arc<UsageTracker>,
    pub transcripts: Arc<TranscriptService>,
    pub scheduler: Option<Mutex<JobScheduler>>,
}

impl AppState {
    /// Wires the collaborators together and restores the persisted selection.
    /// The maintenance scheduler is attached separately by `config::create_app_state`.
    pub fn new(
        provider: Arc<dyn VideoProvider>,
        transcript_source: Arc<dyn TranscriptSource>,
        state_store: Arc<dyn StateStore>,
        config: DiscoveryConfig,
    ) -> Self {
        let selection = match SelectionStore::load_from(state_store.as_ref()) {
            Ok(selection) => selection,
            Err(e) => {
                error!("Failed to restore selection state, starting empty: {e:?}");
                SelectionStore::new()
            }
        };
        info!("Search cache TTL: {}s", config.search_cache_ttl.as_secs());

        let usage = Arc::new(UsageTracker::new(UsageLimits {
            daily_searches: config.daily_search_limit,
            daily_transcripts: config.daily_transcript_limit,
        }));
        let transcripts = Arc::new(TranscriptService::new(
            transcript_source,
            RateLimiter::min_interval(config.transcript_min_interval),
            usage.clone(),
            config.transcript_cache_ttl,
        ));

        Self {
            provider,
            cache: Arc::new(SearchCache::new(config.search_cache_ttl)),
            selection: Arc::new(selection),
            state_store,
            usage,
            transcripts,
            scheduler: None,
            config,
        }
    }

    pub fn persist_selection(&self) {
        if let Err(e) = self.selection.save_to(self.state_store.as_ref()) {
            error!("Failed to persist selection state: {e:?}");
        }
    }
}

pub fn build_rocket(state: AppState) -> Rocket<Build> {
    rocket::build().manage(state).mount(
        "/api",
        routes![
            api::search::search_videos,
            api::search::clear_search_cache,
            api::selection::get_selection,
            api::selection::select_video,
            api::selection::deselect_video,
            api::selection::clear_selection,
            api::video::get_transcript,
            api::video::get_comments,
            api::usage::get_usage,
            api::health::check_api_key,
        ],
    )
}

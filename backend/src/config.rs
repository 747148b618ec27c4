use crate::services::search_cache::SearchCache;
use crate::services::selection::SelectionStore;
use crate::services::state_store::{FileStateStore, StateStore};
use crate::services::transcript::{TranscriptService, YtTranscriptSource};
use crate::services::youtube::YouTubeClient;
use crate::AppState;
use anyhow::Result;
use env_logger::{Builder, Env};
use lazy_static::lazy_static;
use log::{error, info};
use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

lazy_static! {
    pub static ref YOUTUBE_API_KEY: Option<String> = env::var("YOUTUBE_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty());
    pub static ref YOUTUBE_API_BASE_URL: String = env::var("YOUTUBE_API_BASE_URL")
        .unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3".to_string());
    pub static ref YOUTUBE_HTTP_TIMEOUT_SECS: u64 = env_or("YOUTUBE_HTTP_TIMEOUT_SECS", 30);
    pub static ref SHORT_FORM_THRESHOLD_SECS: u64 = env_or("SHORT_FORM_THRESHOLD_SECS", 180);
    pub static ref MAX_PAGE_ITERATIONS: usize = env_or("MAX_PAGE_ITERATIONS", 10);
    pub static ref SEARCH_CACHE_TTL_SECS: u64 = env_or("SEARCH_CACHE_TTL_SECS", 3600);
    pub static ref TRANSCRIPT_MIN_INTERVAL_SECS: u64 = env_or("TRANSCRIPT_MIN_INTERVAL_SECS", 10);
    pub static ref TRANSCRIPT_LANGUAGES: String =
        env::var("TRANSCRIPT_LANGUAGES").unwrap_or_else(|_| "ko,en".to_string());
    pub static ref TRANSCRIPT_CACHE_TTL_SECS: u64 = env_or("TRANSCRIPT_CACHE_TTL_SECS", 86400);
    pub static ref COMMENT_MAX_PAGES: usize = env_or("COMMENT_MAX_PAGES", 3);
    pub static ref DAILY_SEARCH_LIMIT: u32 = env_or("DAILY_SEARCH_LIMIT", 10);
    pub static ref DAILY_TRANSCRIPT_LIMIT: u32 = env_or("DAILY_TRANSCRIPT_LIMIT", 5);
    pub static ref STATE_FILE: String =
        env::var("STATE_FILE").unwrap_or_else(|_| "app_state.json".to_string());
    pub static ref MAINTENANCE_SCHEDULE: String =
        env::var("MAINTENANCE_SCHEDULE").unwrap_or_else(|_| "0 */5 * * * *".to_string());
    pub static ref CORS_ALLOWED_ORIGIN: String =
        env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:8080".to_string());
}

/// Knobs of the discovery pipeline and its collaborators.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Videos at or below this many seconds count as shorts.
    pub short_threshold_secs: u64,
    pub max_page_iterations: usize,
    pub search_cache_ttl: Duration,
    pub transcript_min_interval: Duration,
    pub transcript_languages: Vec<String>,
    pub transcript_cache_ttl: Duration,
    pub comment_max_pages: usize,
    /// Provider-backed searches per day, 0 for no cap.
    pub daily_search_limit: u32,
    /// Uncached transcript fetches per day, 0 for no cap.
    pub daily_transcript_limit: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            short_threshold_secs: 180,
            max_page_iterations: 10,
            search_cache_ttl: Duration::from_secs(3600),
            transcript_min_interval: Duration::from_secs(10),
            transcript_languages: vec!["ko".to_string(), "en".to_string()],
            transcript_cache_ttl: Duration::from_secs(86400),
            comment_max_pages: 3,
            daily_search_limit: 10,
            daily_transcript_limit: 5,
        }
    }
}

impl DiscoveryConfig {
    pub fn from_env() -> Self {
        Self {
            short_threshold_secs: *SHORT_FORM_THRESHOLD_SECS,
            max_page_iterations: (*MAX_PAGE_ITERATIONS).max(1),
            search_cache_ttl: Duration::from_secs(*SEARCH_CACHE_TTL_SECS),
            transcript_min_interval: Duration::from_secs(*TRANSCRIPT_MIN_INTERVAL_SECS),
            transcript_languages: parse_languages(&TRANSCRIPT_LANGUAGES),
            transcript_cache_ttl: Duration::from_secs(*TRANSCRIPT_CACHE_TTL_SECS),
            comment_max_pages: (*COMMENT_MAX_PAGES).max(1),
            daily_search_limit: *DAILY_SEARCH_LIMIT,
            daily_transcript_limit: *DAILY_TRANSCRIPT_LIMIT,
        }
    }
}

fn parse_languages(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(String::from)
        .collect()
}

pub fn init_logger() {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Starting discovery backend...");
}

pub fn load_environment() {
    dotenv::dotenv().ok();
}

pub fn create_youtube_client(short_threshold_secs: u64) -> Result<YouTubeClient> {
    if YOUTUBE_API_KEY.is_none() {
        error!("YOUTUBE_API_KEY is not set; provider calls will fail until it is configured");
    }
    info!("Using YouTube Data API at: {}", &*YOUTUBE_API_BASE_URL);

    YouTubeClient::new(
        YOUTUBE_API_KEY.clone(),
        &YOUTUBE_API_BASE_URL,
        Duration::from_secs(*YOUTUBE_HTTP_TIMEOUT_SECS),
        short_threshold_secs,
    )
}

pub async fn setup_maintenance_scheduler(
    cache: Arc<SearchCache>,
    transcripts: Arc<TranscriptService>,
    selection: Arc<SelectionStore>,
    state_store: Arc<dyn StateStore>,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let maintenance_job = Job::new_async(MAINTENANCE_SCHEDULE.as_str(), move |_uuid, _l| {
        let cache = cache.clone();
        let transcripts = transcripts.clone();
        let selection = selection.clone();
        let state_store = state_store.clone();
        Box::pin(async move {
            let purged = cache.purge_expired();
            if purged > 0 {
                info!("Purged {purged} expired search cache entries");
            }
            let purged = transcripts.purge_expired();
            if purged > 0 {
                info!("Purged {purged} expired transcripts");
            }
            if let Err(e) = selection.save_to(state_store.as_ref()) {
                error!("Failed to persist selection state: {e:?}");
            }
        })
    })?;

    scheduler.add(maintenance_job).await?;
    scheduler.start().await?;
    info!("Maintenance scheduler started.");

    Ok(scheduler)
}

pub async fn create_app_state() -> Result<AppState> {
    let config = DiscoveryConfig::from_env();
    let provider = Arc::new(create_youtube_client(config.short_threshold_secs)?);
    let state_store: Arc<dyn StateStore> = Arc::new(FileStateStore::new(STATE_FILE.as_str()));
    let transcript_source = Arc::new(YtTranscriptSource::new(config.transcript_languages.clone()));

    let mut state = AppState::new(provider, transcript_source, state_store, config);

    let scheduler = setup_maintenance_scheduler(
        state.cache.clone(),
        state.transcripts.clone(),
        state.selection.clone(),
        state.state_store.clone(),
    )
    .await?;
    state.scheduler = Some(Mutex::new(scheduler));

    Ok(state)
}

pub fn create_cors() -> Result<rocket_cors::Cors> {
    let origin = CORS_ALLOWED_ORIGIN.as_str();
    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::some_exact(&[origin]))
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Delete, Method::Options]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allowed_headers(AllowedHeaders::some(&["Accept", "Content-Type"]))
        .allow_credentials(true)
        .to_cors()
        .map_err(|e| anyhow::anyhow!("Failed to create CORS options: {}", e))?;

    Ok(cors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn languages_are_trimmed_and_split() {
        assert_eq!(parse_languages(" ko, en ,,ja"), vec!["ko", "en", "ja"]);
        assert!(parse_languages("").is_empty());
    }

    #[test]
    fn defaults_use_latest_short_threshold() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.short_threshold_secs, 180);
        assert_eq!(config.max_page_iterations, 10);
    }
}

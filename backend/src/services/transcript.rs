use async_trait::async_trait;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use yt_transcript_rs::api::YouTubeTranscriptApi;

use crate::errors::UsageLimitReached;
use crate::models::UsageKind;
use crate::services::rate_limiter::RateLimiter;
use crate::services::usage::UsageTracker;

/// Fetches the plain text transcript of a video. Errors are opaque strings.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_transcript(&self, video_id: &str) -> Result<String, String>;
}

pub struct YtTranscriptSource {
    languages: Vec<String>,
}

impl YtTranscriptSource {
    pub fn new(languages: Vec<String>) -> Self {
        Self { languages }
    }
}

#[async_trait]
impl TranscriptSource for YtTranscriptSource {
    async fn fetch_transcript(&self, video_id: &str) -> Result<String, String> {
        let api = YouTubeTranscriptApi::new(None, None, None)
            .map_err(|e| format!("Failed to create YouTubeTranscriptApi: {e:?}"))?;
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();

        let transcript = api
            .fetch_transcript(video_id, &languages, false)
            .await
            .map_err(|e| format!("Failed to fetch transcript: {e:?}"))?;

        let text = transcript
            .into_iter()
            .map(|entry| entry.text.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if text.is_empty() {
            Err("Transcript is empty".to_string())
        } else {
            Ok(text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptOutcome {
    Text { text: String, cached: bool },
    RateLimited { retry_after: Duration },
    LimitReached(UsageLimitReached),
    Unavailable { reason: String },
}

struct CachedTranscript {
    text: String,
    stored_at: Instant,
}

/// Rate-limited, caching front for a [`TranscriptSource`]. Cached transcripts
/// skip both the daily allowance and the limiter; entries expire after `ttl`.
pub struct TranscriptService {
    source: Arc<dyn TranscriptSource>,
    limiter: RateLimiter,
    usage: Arc<UsageTracker>,
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedTranscript>>,
}

impl TranscriptService {
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        limiter: RateLimiter,
        usage: Arc<UsageTracker>,
        ttl: Duration,
    ) -> Self {
        Self {
            source,
            limiter,
            usage,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, video_id: &str) -> Option<String> {
        let cache = self.cache.lock().ok()?;
        cache
            .get(video_id)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.text.clone())
    }

    /// Drops expired transcripts and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let Ok(mut cache) = self.cache.lock() else {
            return 0;
        };
        let before = cache.len();
        cache.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        before - cache.len()
    }

    pub async fn transcript(&self, video_id: &str) -> TranscriptOutcome {
        if let Some(text) = self.cached(video_id) {
            return TranscriptOutcome::Text { text, cached: true };
        }

        if let Err(limit) = self.usage.check(UsageKind::Transcript) {
            return TranscriptOutcome::LimitReached(limit);
        }

        if let Err(retry_after) = self.limiter.try_acquire() {
            info!(
                "Transcript request for {video_id} rate limited, retry in {}s",
                retry_after.as_secs()
            );
            return TranscriptOutcome::RateLimited { retry_after };
        }

        match self.source.fetch_transcript(video_id).await {
            Ok(text) => {
                info!("Fetched transcript for {video_id} ({} chars)", text.len());
                self.usage.record(UsageKind::Transcript);
                if let Ok(mut cache) = self.cache.lock() {
                    cache.insert(
                        video_id.to_string(),
                        CachedTranscript {
                            text: text.clone(),
                            stored_at: Instant::now(),
                        },
                    );
                }
                TranscriptOutcome::Text {
                    text,
                    cached: false,
                }
            }
            Err(reason) => {
                warn!("Transcript for {video_id} unavailable: {reason}");
                TranscriptOutcome::Unavailable { reason }
            }
        }
    }
}

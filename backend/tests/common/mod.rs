#![allow(dead_code)]

use async_trait::async_trait;
use discovery::errors::ProviderError;
use discovery::models::{
    ChannelStats, Comment, CommentPage, SearchHit, SearchPage, SearchQuery, VideoStats,
};
use discovery::services::state_store::StateStore;
use discovery::services::transcript::TranscriptSource;
use discovery::services::youtube::VideoProvider;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// One scripted response of the search endpoint.
pub enum Scripted {
    /// A page plus the video statistics the videos endpoint reports while
    /// this page is current.
    Page(SearchPage, Vec<VideoStats>),
    Quota,
    Fail(u16),
}

/// Error raised by a statistics endpoint once it has answered `after` calls.
#[derive(Clone, Copy)]
pub enum Failure {
    Quota,
    Fail(u16),
}

impl Failure {
    fn error(self) -> ProviderError {
        match self {
            Failure::Quota => quota_error(),
            Failure::Fail(status) => api_error(status),
        }
    }
}

fn quota_error() -> ProviderError {
    ProviderError::QuotaExceeded(
        "The request cannot be completed because you have exceeded your quota.".into(),
    )
}

fn api_error(status: u16) -> ProviderError {
    ProviderError::Api {
        status,
        reason: "backendError".into(),
        message: "Backend Error".into(),
    }
}

/// In-memory provider replaying a fixed script of search pages.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Scripted>>,
    channels: HashMap<String, ChannelStats>,
    current_videos: Mutex<HashMap<String, VideoStats>>,
    comments: Vec<Comment>,
    channel_failure: Option<(usize, Failure)>,
    video_failure: Option<(usize, Failure)>,
    pub search_calls: AtomicUsize,
    pub requested_sizes: Mutex<Vec<usize>>,
    pub requested_tokens: Mutex<Vec<Option<String>>>,
    pub channel_batches: Mutex<Vec<Vec<String>>>,
    pub video_batches: Mutex<Vec<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Scripted>, channels: Vec<ChannelStats>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            channels: channels
                .into_iter()
                .map(|c| (c.channel_id.clone(), c))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = comments;
        self
    }

    pub fn failing_channels_after(mut self, after: usize, failure: Failure) -> Self {
        self.channel_failure = Some((after, failure));
        self
    }

    pub fn failing_videos_after(mut self, after: usize, failure: Failure) -> Self {
        self.video_failure = Some((after, failure));
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoProvider for ScriptedProvider {
    async fn search_page(
        &self,
        _query: &SearchQuery,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<SearchPage, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_sizes.lock().unwrap().push(max_results);
        self.requested_tokens
            .lock()
            .unwrap()
            .push(page_token.map(String::from));

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Page(page, videos)) => {
                *self.current_videos.lock().unwrap() = videos
                    .into_iter()
                    .map(|v| (v.video_id.clone(), v))
                    .collect();
                Ok(page)
            }
            Some(Scripted::Quota) => Err(quota_error()),
            Some(Scripted::Fail(status)) => Err(api_error(status)),
            None => Ok(SearchPage::default()),
        }
    }

    async fn channel_statistics(
        &self,
        channel_ids: &[String],
    ) -> Result<Vec<ChannelStats>, ProviderError> {
        let mut batches = self.channel_batches.lock().unwrap();
        if let Some((after, failure)) = self.channel_failure {
            if batches.len() >= after {
                return Err(failure.error());
            }
        }
        batches.push(channel_ids.to_vec());
        Ok(channel_ids
            .iter()
            .filter_map(|id| self.channels.get(id).cloned())
            .collect())
    }

    async fn video_statistics(
        &self,
        video_ids: &[String],
    ) -> Result<Vec<VideoStats>, ProviderError> {
        let mut batches = self.video_batches.lock().unwrap();
        if let Some((after, failure)) = self.video_failure {
            if batches.len() >= after {
                return Err(failure.error());
            }
        }
        batches.push(video_ids.to_vec());
        let current = self.current_videos.lock().unwrap();
        Ok(video_ids
            .iter()
            .filter_map(|id| current.get(id).cloned())
            .collect())
    }

    async fn comment_threads(
        &self,
        _video_id: &str,
        _page_token: Option<&str>,
    ) -> Result<CommentPage, ProviderError> {
        Ok(CommentPage {
            comments: self.comments.clone(),
            next_page_token: None,
        })
    }
}

pub fn video(id: &str, channel_id: &str, views: u64, duration_seconds: u64) -> VideoStats {
    VideoStats {
        video_id: id.to_string(),
        title: format!("Video {id}"),
        channel_id: channel_id.to_string(),
        channel_name: format!("Channel {channel_id}"),
        view_count: views,
        comment_count: views / 100,
        duration_seconds,
        ..Default::default()
    }
}

pub fn channel(id: &str, subscribers: u64, total_views: u64, videos: u64) -> ChannelStats {
    ChannelStats {
        channel_id: id.to_string(),
        subscriber_count: subscribers,
        total_view_count: total_views,
        video_count: videos,
    }
}

/// A page whose hits mirror `videos` in order.
pub fn page(videos: Vec<VideoStats>, next_page_token: Option<&str>) -> Scripted {
    let hits = videos
        .iter()
        .map(|v| SearchHit {
            video_id: v.video_id.clone(),
            channel_id: v.channel_id.clone(),
            published_at: None,
        })
        .collect();
    Scripted::Page(
        SearchPage {
            hits,
            next_page_token: next_page_token.map(String::from),
        },
        videos,
    )
}

#[derive(Default)]
pub struct MemoryStateStore {
    blob: Mutex<Option<Vec<u8>>>,
}

impl StateStore for MemoryStateStore {
    fn save(&self, blob: &[u8]) -> anyhow::Result<()> {
        *self.blob.lock().unwrap() = Some(blob.to_vec());
        Ok(())
    }

    fn load(&self) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.blob.lock().unwrap().clone())
    }
}

pub struct StaticTranscripts;

#[async_trait]
impl TranscriptSource for StaticTranscripts {
    async fn fetch_transcript(&self, video_id: &str) -> Result<String, String> {
        if video_id.starts_with("none") {
            Err("No transcript available".to_string())
        } else {
            Ok(format!("hello from {video_id}"))
        }
    }
}

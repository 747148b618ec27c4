use log::debug;
use std::collections::HashMap;

use crate::errors::ProviderError;
use crate::models::{
    BreakoutGrade, ChannelStats, PerformanceTier, VideoRecord, VideoStats, PROVIDER_PAGE_SIZE,
};
use crate::services::youtube::VideoProvider;
use crate::utils::watch_url;

/// Performance tier thresholds, percent above the channel average.
const TIER_SUPER_PCT: f64 = 200.0;
const TIER_HIGH_PCT: f64 = 100.0;
const TIER_GOOD_PCT: f64 = 50.0;

/// Breakout grade thresholds on views per subscriber.
const GRADE_LEGEND_RATIO: f64 = 5.0;
const GRADE_SUPER_RATIO: f64 = 2.0;
const GRADE_HIGH_RATIO: f64 = 1.0;
const GRADE_GOOD_RATIO: f64 = 0.5;

pub fn view_to_subscriber_ratio(view_count: u64, subscriber_count: u64) -> f64 {
    if subscriber_count > 0 {
        view_count as f64 / subscriber_count as f64
    } else {
        0.0
    }
}

pub fn performance_tier(view_count: u64, average_views: f64) -> PerformanceTier {
    if average_views <= 0.0 {
        return PerformanceTier::None;
    }

    let pct = (view_count as f64 - average_views) / average_views * 100.0;
    if pct >= TIER_SUPER_PCT {
        PerformanceTier::Super
    } else if pct >= TIER_HIGH_PCT {
        PerformanceTier::High
    } else if pct >= TIER_GOOD_PCT {
        PerformanceTier::Good
    } else {
        PerformanceTier::None
    }
}

pub fn breakout_grade(ratio: f64) -> BreakoutGrade {
    if ratio >= GRADE_LEGEND_RATIO {
        BreakoutGrade::Legend
    } else if ratio >= GRADE_SUPER_RATIO {
        BreakoutGrade::Super
    } else if ratio >= GRADE_HIGH_RATIO {
        BreakoutGrade::High
    } else if ratio >= GRADE_GOOD_RATIO {
        BreakoutGrade::Good
    } else {
        BreakoutGrade::None
    }
}

/// Resolves channel and video statistics in batches and turns them into
/// scored [`VideoRecord`]s.
pub struct MetricEnricher<'a> {
    provider: &'a dyn VideoProvider,
    short_threshold_secs: u64,
}

impl<'a> MetricEnricher<'a> {
    pub fn new(provider: &'a dyn VideoProvider, short_threshold_secs: u64) -> Self {
        Self {
            provider,
            short_threshold_secs,
        }
    }

    /// `channel_ids` must already be deduplicated. One provider call per
    /// [`PROVIDER_PAGE_SIZE`] ids, so a single search page costs one call.
    pub async fn resolve_channel_stats(
        &self,
        channel_ids: &[String],
    ) -> Result<HashMap<String, ChannelStats>, ProviderError> {
        let mut stats = HashMap::with_capacity(channel_ids.len());
        for chunk in channel_ids.chunks(PROVIDER_PAGE_SIZE) {
            for channel in self.provider.channel_statistics(chunk).await? {
                stats.insert(channel.channel_id.clone(), channel);
            }
        }
        debug!(
            "Resolved statistics for {}/{} channels",
            stats.len(),
            channel_ids.len()
        );
        Ok(stats)
    }

    pub async fn resolve_video_stats(
        &self,
        video_ids: &[String],
    ) -> Result<HashMap<String, VideoStats>, ProviderError> {
        let mut stats = HashMap::with_capacity(video_ids.len());
        for chunk in video_ids.chunks(PROVIDER_PAGE_SIZE) {
            for video in self.provider.video_statistics(chunk).await? {
                stats.insert(video.video_id.clone(), video);
            }
        }
        Ok(stats)
    }

    pub fn score(
        &self,
        videos: &[VideoStats],
        channel_stats: &HashMap<String, ChannelStats>,
    ) -> Vec<VideoRecord> {
        videos
            .iter()
            .map(|video| self.score_video(video, channel_stats.get(&video.channel_id)))
            .collect()
    }

    /// A channel missing from the batch scores as an empty channel.
    pub fn score_video(&self, video: &VideoStats, channel: Option<&ChannelStats>) -> VideoRecord {
        let (subscriber_count, average_views) = channel
            .map(|c| (c.subscriber_count, c.average_views()))
            .unwrap_or((0, 0.0));

        let ratio = view_to_subscriber_ratio(video.view_count, subscriber_count);

        VideoRecord {
            video_id: video.video_id.clone(),
            title: video.title.clone(),
            channel_name: video.channel_name.clone(),
            channel_id: video.channel_id.clone(),
            url: watch_url(&video.video_id),
            thumbnail_url: video.thumbnail_url.clone(),
            view_count: video.view_count,
            comment_count: video.comment_count,
            subscriber_count,
            published_at: video.published_at,
            duration_seconds: video.duration_seconds,
            is_short: video.duration_seconds <= self.short_threshold_secs,
            view_to_subscriber_ratio: ratio,
            view_diff_from_channel_average: video.view_count as f64 - average_views,
            performance_tier: performance_tier(video.view_count, average_views),
            breakout_grade: breakout_grade(ratio),
        }
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::Responder;
use rocket::serde::{Deserialize, Serialize};
use rocket::{response, Response};
use std::fmt;
use std::io::Cursor;

use crate::errors::QueryError;

/// Upper bound on `maxResults` / batched ids per provider call.
pub const PROVIDER_PAGE_SIZE: usize = 50;
pub const MAX_TARGET_COUNT: usize = PROVIDER_PAGE_SIZE * 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationFilter {
    #[default]
    All,
    Short,
    Long,
}

impl DurationFilter {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Some(DurationFilter::All),
            "short" => Some(DurationFilter::Short),
            "long" => Some(DurationFilter::Long),
            _ => None,
        }
    }

    pub fn accepts(&self, is_short: bool) -> bool {
        match self {
            DurationFilter::All => true,
            DurationFilter::Short => is_short,
            DurationFilter::Long => !is_short,
        }
    }
}

/// Parameters of one search invocation. Validated on construction and
/// immutable afterwards; doubles as the search cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SearchQuery {
    keyword: String,
    target_count: usize,
    published_after: Option<DateTime<Utc>>,
    published_before: Option<DateTime<Utc>>,
    duration_filter: DurationFilter,
    min_view_count: u64,
    min_subscriber_count: u64,
}

impl SearchQuery {
    pub fn new(keyword: &str, target_count: usize) -> Result<Self, QueryError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(QueryError::EmptyKeyword);
        }
        if target_count == 0 {
            return Err(QueryError::ZeroTargetCount);
        }

        Ok(Self {
            keyword: keyword.to_string(),
            target_count: target_count.min(MAX_TARGET_COUNT),
            published_after: None,
            published_before: None,
            duration_filter: DurationFilter::All,
            min_view_count: 0,
            min_subscriber_count: 0,
        })
    }

    pub fn published_between(
        mut self,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Result<Self, QueryError> {
        if let (Some(a), Some(b)) = (after, before) {
            if a > b {
                return Err(QueryError::InvertedDateRange);
            }
        }
        self.published_after = after;
        self.published_before = before;
        Ok(self)
    }

    pub fn with_duration(mut self, filter: DurationFilter) -> Self {
        self.duration_filter = filter;
        self
    }

    pub fn with_min_views(mut self, min_view_count: u64) -> Self {
        self.min_view_count = min_view_count;
        self
    }

    pub fn with_min_subscribers(mut self, min_subscriber_count: u64) -> Self {
        self.min_subscriber_count = min_subscriber_count;
        self
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn published_after(&self) -> Option<DateTime<Utc>> {
        self.published_after
    }

    pub fn published_before(&self) -> Option<DateTime<Utc>> {
        self.published_before
    }

    pub fn duration_filter(&self) -> DurationFilter {
        self.duration_filter
    }

    pub fn min_view_count(&self) -> u64 {
        self.min_view_count
    }

    pub fn min_subscriber_count(&self) -> u64 {
        self.min_subscriber_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelStats {
    pub channel_id: String,
    pub subscriber_count: u64,
    pub total_view_count: u64,
    pub video_count: u64,
}

impl ChannelStats {
    pub fn average_views(&self) -> f64 {
        if self.video_count > 0 {
            self.total_view_count as f64 / self.video_count as f64
        } else {
            0.0
        }
    }
}

/// One hit of a search page, in provider relevance order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub video_id: String,
    pub channel_id: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    pub next_page_token: Option<String>,
}

/// Raw per-video data from the videos endpoint, before scoring.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoStats {
    pub video_id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_name: String,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail_url: String,
    pub view_count: u64,
    pub comment_count: u64,
    pub duration_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerformanceTier {
    #[serde(rename = "TIER_SUPER")]
    Super,
    #[serde(rename = "TIER_HIGH")]
    High,
    #[serde(rename = "TIER_GOOD")]
    Good,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakoutGrade {
    #[serde(rename = "GRADE_LEGEND")]
    Legend,
    #[serde(rename = "GRADE_SUPER")]
    Super,
    #[serde(rename = "GRADE_HIGH")]
    High,
    #[serde(rename = "GRADE_GOOD")]
    Good,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub channel_name: String,
    pub channel_id: String,
    pub url: String,
    pub thumbnail_url: String,
    pub view_count: u64,
    pub comment_count: u64,
    pub subscriber_count: u64, // snapshot at scoring time
    pub published_at: Option<DateTime<Utc>>,
    pub duration_seconds: u64,
    pub is_short: bool,
    pub view_to_subscriber_ratio: f64,
    pub view_diff_from_channel_average: f64,
    pub performance_tier: PerformanceTier,
    pub breakout_grade: BreakoutGrade,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub records: Vec<VideoRecord>,
    pub quota_exceeded: bool,
    pub page_limit_reached: bool,
    pub cancelled: bool,
    pub pages_fetched: usize,
}

impl SearchOutcome {
    /// Only complete runs are worth replaying from cache.
    pub fn is_complete(&self) -> bool {
        !self.quota_exceeded && !self.cancelled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub like_count: u64,
    pub published_date: String, // YYYY-MM-DD
    pub is_reply: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPage {
    pub comments: Vec<Comment>,
    pub next_page_token: Option<String>,
}

/// Blob persisted between sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub selected_video_ids: Vec<String>,
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRow {
    #[serde(flatten)]
    pub record: VideoRecord,
    pub selected: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<VideoRow>,
    pub total: usize,
    pub quota_exceeded: bool,
    pub page_limit_reached: bool,
    pub cached: bool,
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionResponse {
    pub selected: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheClearResponse {
    pub cleared: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub video_id: String,
    pub text: Option<String>,
    pub cached: bool,
    pub retry_after_secs: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiKeyCheck {
    pub ok: bool,
    pub message: String,
}

/// Provider-backed actions that count against the daily allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageKind {
    Search,
    Transcript,
}

impl fmt::Display for UsageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageKind::Search => f.write_str("search"),
            UsageKind::Transcript => f.write_str("transcript"),
        }
    }
}

/// Limits of zero mean unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStatus {
    pub date: NaiveDate,
    pub searches_used: u32,
    pub search_limit: u32,
    pub transcripts_used: u32,
    pub transcript_limit: u32,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip)]
    pub status: Status,
}

impl ErrorResponse {
    pub fn new(status: Status, error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            status,
        }
    }
}

impl<'r> Responder<'r, 'static> for ErrorResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let json = serde_json::to_string(&self).map_err(|_| Status::InternalServerError)?;
        Response::build()
            .status(self.status)
            .header(ContentType::JSON)
            .sized_body(json.len(), Cursor::new(json))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn query_rejects_blank_keyword_and_zero_count() {
        assert_eq!(SearchQuery::new("   ", 10), Err(QueryError::EmptyKeyword));
        assert_eq!(SearchQuery::new("rust", 0), Err(QueryError::ZeroTargetCount));
    }

    #[test]
    fn query_caps_target_count() {
        let query = SearchQuery::new(" rust ", 10_000).unwrap();
        assert_eq!(query.keyword(), "rust");
        assert_eq!(query.target_count(), MAX_TARGET_COUNT);
    }

    #[test]
    fn query_rejects_inverted_range() {
        let after = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let result = SearchQuery::new("rust", 10)
            .unwrap()
            .published_between(Some(after), Some(before));
        assert_eq!(result, Err(QueryError::InvertedDateRange));
    }

    #[test]
    fn average_views_is_zero_without_videos() {
        let stats = ChannelStats {
            channel_id: "UC1".into(),
            subscriber_count: 10,
            total_view_count: 5_000,
            video_count: 0,
        };
        assert_eq!(stats.average_views(), 0.0);
    }

    #[test]
    fn tiers_and_grades_serialize_with_prefixes() {
        assert_eq!(
            serde_json::to_string(&PerformanceTier::Super).unwrap(),
            "\"TIER_SUPER\""
        );
        assert_eq!(serde_json::to_string(&PerformanceTier::None).unwrap(), "\"NONE\"");
        assert_eq!(
            serde_json::to_string(&BreakoutGrade::Legend).unwrap(),
            "\"GRADE_LEGEND\""
        );
    }

    #[test]
    fn duration_filter_parsing() {
        assert_eq!(DurationFilter::parse("SHORT"), Some(DurationFilter::Short));
        assert_eq!(DurationFilter::parse(""), Some(DurationFilter::All));
        assert_eq!(DurationFilter::parse("medium"), None);
        assert!(DurationFilter::Long.accepts(false));
        assert!(!DurationFilter::Long.accepts(true));
    }
}

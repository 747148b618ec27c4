use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;
use crate::models::{
    ChannelStats, Comment, CommentPage, DurationFilter, SearchHit, SearchPage, SearchQuery,
    VideoStats, PROVIDER_PAGE_SIZE,
};
use crate::utils::{parse_count, parse_iso8601_duration_to_seconds, parse_rfc3339};

/// The external video index. Every call is one request; nothing is retried.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    async fn search_page(
        &self,
        query: &SearchQuery,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<SearchPage, ProviderError>;

    /// At most [`PROVIDER_PAGE_SIZE`] ids per call.
    async fn channel_statistics(
        &self,
        channel_ids: &[String],
    ) -> Result<Vec<ChannelStats>, ProviderError>;

    /// At most [`PROVIDER_PAGE_SIZE`] ids per call.
    async fn video_statistics(&self, video_ids: &[String])
        -> Result<Vec<VideoStats>, ProviderError>;

    async fn comment_threads(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<CommentPage, ProviderError>;
}

/// `videoDuration=short` only returns videos under four minutes.
const PROVIDER_SHORT_MAX_SECS: u64 = 240;

pub struct YouTubeClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
    short_threshold_secs: u64,
}

impl YouTubeClient {
    pub fn new(
        api_key: Option<String>,
        base_url: &str,
        timeout: Duration,
        short_threshold_secs: u64,
    ) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            short_threshold_secs,
        })
    }

    fn search_params(
        &self,
        query: &SearchQuery,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("part", "snippet".to_string()),
            ("q", query.keyword().to_string()),
            ("type", "video".to_string()),
            ("order", "relevance".to_string()),
            ("maxResults", max_results.min(PROVIDER_PAGE_SIZE).to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        if let Some(after) = query.published_after() {
            params.push(("publishedAfter", after.to_rfc3339()));
        }
        if let Some(before) = query.published_before() {
            params.push(("publishedBefore", before.to_rfc3339()));
        }
        // Only a narrowing hint; with a threshold of four minutes or more it
        // would hide videos the post-filter accepts.
        if query.duration_filter() == DurationFilter::Short
            && self.short_threshold_secs < PROVIDER_SHORT_MAX_SECS
        {
            params.push(("videoDuration", "short".to_string()));
        }
        params
    }

    // Documentation: https://developers.google.com/youtube/v3/docs
    async fn get_json(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or(ProviderError::MissingApiKey)?;

        let mut url = Url::parse(&format!("{}/{}", self.base_url, endpoint))
            .map_err(|e| ProviderError::Malformed(format!("invalid endpoint url: {e}")))?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("key", api_key);

        debug!("GET {}/{} {:?}", self.base_url, endpoint, params);

        let response = self.http.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(ProviderError::from_response(status.as_u16(), &body));
        }
        if !body.is_object() {
            return Err(ProviderError::Malformed(format!(
                "{endpoint} returned a non-object body"
            )));
        }

        Ok(body)
    }
}

#[async_trait]
impl VideoProvider for YouTubeClient {
    async fn search_page(
        &self,
        query: &SearchQuery,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<SearchPage, ProviderError> {
        let params = self.search_params(query, page_token, max_results);
        let response = self.get_json("search", &params).await?;
        let page = parse_search_page(&response);
        info!(
            "Search page for {:?}: {} hits, next page: {}",
            query.keyword(),
            page.hits.len(),
            page.next_page_token.is_some()
        );
        Ok(page)
    }

    async fn channel_statistics(
        &self,
        channel_ids: &[String],
    ) -> Result<Vec<ChannelStats>, ProviderError> {
        if channel_ids.is_empty() {
            return Ok(Vec::new());
        }
        let params = [
            ("part", "statistics".to_string()),
            ("id", channel_ids.join(",")),
            ("maxResults", PROVIDER_PAGE_SIZE.to_string()),
        ];
        let response = self.get_json("channels", &params).await?;
        Ok(parse_channel_stats(&response))
    }

    async fn video_statistics(
        &self,
        video_ids: &[String],
    ) -> Result<Vec<VideoStats>, ProviderError> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        let params = [
            ("part", "snippet,statistics,contentDetails".to_string()),
            ("id", video_ids.join(",")),
            ("maxResults", PROVIDER_PAGE_SIZE.to_string()),
        ];
        let response = self.get_json("videos", &params).await?;
        Ok(parse_video_stats(&response))
    }

    async fn comment_threads(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<CommentPage, ProviderError> {
        let mut params = vec![
            ("part", "snippet,replies".to_string()),
            ("videoId", video_id.to_string()),
            ("maxResults", PROVIDER_PAGE_SIZE.to_string()),
            ("order", "relevance".to_string()),
            ("textFormat", "plainText".to_string()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        let response = self.get_json("commentThreads", &params).await?;
        Ok(parse_comment_page(&response))
    }
}

fn next_page_token(response: &Value) -> Option<String> {
    response["nextPageToken"]
        .as_str()
        .filter(|t| !t.is_empty())
        .map(String::from)
}

pub fn parse_search_page(response: &Value) -> SearchPage {
    let hits = response["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    // Non-video hits can slip through; they carry no videoId.
                    let video_id = item["id"]["videoId"].as_str()?;
                    Some(SearchHit {
                        video_id: video_id.to_string(),
                        channel_id: item["snippet"]["channelId"]
                            .as_str()
                            .unwrap_or("")
                            .to_string(),
                        published_at: parse_rfc3339(
                            item["snippet"]["publishedAt"].as_str().unwrap_or(""),
                        ),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    SearchPage {
        hits,
        next_page_token: next_page_token(response),
    }
}

pub fn parse_channel_stats(response: &Value) -> Vec<ChannelStats> {
    response["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let channel_id = item["id"].as_str()?;
                    let stats = &item["statistics"];
                    Some(ChannelStats {
                        channel_id: channel_id.to_string(),
                        // hiddenSubscriberCount channels omit the field
                        subscriber_count: parse_count(&stats["subscriberCount"]),
                        total_view_count: parse_count(&stats["viewCount"]),
                        video_count: parse_count(&stats["videoCount"]),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn parse_video_stats(response: &Value) -> Vec<VideoStats> {
    response["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let video_id = item["id"].as_str()?;
                    let snippet = &item["snippet"];
                    let statistics = &item["statistics"];
                    Some(VideoStats {
                        video_id: video_id.to_string(),
                        title: snippet["title"].as_str().unwrap_or("").to_string(),
                        channel_id: snippet["channelId"].as_str().unwrap_or("").to_string(),
                        channel_name: snippet["channelTitle"].as_str().unwrap_or("").to_string(),
                        published_at: parse_rfc3339(snippet["publishedAt"].as_str().unwrap_or("")),
                        thumbnail_url: snippet["thumbnails"]["medium"]["url"]
                            .as_str()
                            .unwrap_or("")
                            .to_string(),
                        view_count: parse_count(&statistics["viewCount"]),
                        comment_count: parse_count(&statistics["commentCount"]),
                        duration_seconds: parse_iso8601_duration_to_seconds(
                            item["contentDetails"]["duration"].as_str().unwrap_or(""),
                        ),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_comment(snippet: &Value, is_reply: bool) -> Comment {
    Comment {
        author: snippet["authorDisplayName"].as_str().unwrap_or("").to_string(),
        text: snippet["textDisplay"].as_str().unwrap_or("").to_string(),
        like_count: parse_count(&snippet["likeCount"]),
        published_date: snippet["publishedAt"]
            .as_str()
            .unwrap_or("")
            .chars()
            .take(10)
            .collect(),
        is_reply,
    }
}

pub fn parse_comment_page(response: &Value) -> CommentPage {
    let mut comments = Vec::new();

    if let Some(items) = response["items"].as_array() {
        for item in items {
            let top_level = &item["snippet"]["topLevelComment"]["snippet"];
            if top_level.is_object() {
                comments.push(parse_comment(top_level, false));
            }
            if let Some(replies) = item["replies"]["comments"].as_array() {
                for reply in replies {
                    comments.push(parse_comment(&reply["snippet"], true));
                }
            }
        }
    }

    CommentPage {
        comments,
        next_page_token: next_page_token(response),
    }
}

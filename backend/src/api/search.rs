use crate::errors::QueryError;
use crate::models::{CacheClearResponse, DurationFilter, ErrorResponse, SearchQuery, SearchResponse};
use crate::services::search_service::{build_search_response, cached_search};
use crate::utils::parse_date_bound;
use crate::AppState;
use log::info;
use rocket::serde::json::Json;
use rocket::{delete, get, State};

const DEFAULT_COUNT: usize = 50;

#[allow(clippy::too_many_arguments)]
fn build_query(
    keyword: &str,
    count: Option<usize>,
    after: Option<&str>,
    before: Option<&str>,
    duration: Option<&str>,
    min_views: Option<u64>,
    min_subscribers: Option<u64>,
) -> Result<SearchQuery, QueryError> {
    let after = after
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_date_bound("after", v, false))
        .transpose()?;
    let before = before
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_date_bound("before", v, true))
        .transpose()?;
    let duration = match duration {
        Some(raw) => DurationFilter::parse(raw).ok_or_else(|| QueryError::InvalidParameter {
            field: "duration",
            value: raw.to_string(),
        })?,
        None => DurationFilter::All,
    };

    Ok(SearchQuery::new(keyword, count.unwrap_or(DEFAULT_COUNT))?
        .published_between(after, before)?
        .with_duration(duration)
        .with_min_views(min_views.unwrap_or(0))
        .with_min_subscribers(min_subscribers.unwrap_or(0)))
}

#[allow(clippy::too_many_arguments)]
#[get("/search?<keyword>&<count>&<after>&<before>&<duration>&<min_views>&<min_subscribers>")]
pub async fn search_videos(
    keyword: &str,
    count: Option<usize>,
    after: Option<&str>,
    before: Option<&str>,
    duration: Option<&str>,
    min_views: Option<u64>,
    min_subscribers: Option<u64>,
    state: &State<AppState>,
) -> Result<Json<SearchResponse>, ErrorResponse> {
    let query = build_query(keyword, count, after, before, duration, min_views, min_subscribers)?;

    let (outcome, cached) = cached_search(
        state.provider.as_ref(),
        &state.config,
        &state.cache,
        &state.usage,
        &query,
    )
    .await?;

    Ok(Json(build_search_response(outcome, cached, &state.selection)))
}

#[delete("/search/cache")]
pub async fn clear_search_cache(state: &State<AppState>) -> Json<CacheClearResponse> {
    let cleared = state.cache.clear();
    info!("Cleared {cleared} cached searches");
    Json(CacheClearResponse { cleared })
}

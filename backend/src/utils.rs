use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde_json::Value;

use crate::errors::QueryError;

/// Parse an RFC 3339 timestamp (`2024-01-31T12:00:00Z`) as the provider sends it.
pub fn parse_rfc3339(date_str: &str) -> Option<DateTime<Utc>> {
    if date_str.is_empty() {
        return None;
    }

    match date_str.parse::<DateTime<Utc>>() {
        Ok(dt) => Some(dt),
        Err(e) => {
            debug!("Ignoring unparseable timestamp {date_str:?}: {e}");
            None
        }
    }
}

/// Parse a user supplied date bound: full RFC 3339, or a plain `YYYY-MM-DD`
/// which expands to the start of that day (or its last second for `end_of_day`).
pub fn parse_date_bound(
    field: &'static str,
    value: &str,
    end_of_day: bool,
) -> Result<DateTime<Utc>, QueryError> {
    let value = value.trim();
    if let Ok(dt) = value.parse::<DateTime<Utc>>() {
        return Ok(dt);
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        QueryError::InvalidParameter {
            field,
            value: value.to_string(),
        }
    })?;

    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)
    } else {
        date.and_hms_opt(0, 0, 0)
    };

    time.map(|t| t.and_utc())
        .ok_or_else(|| QueryError::InvalidParameter {
            field,
            value: value.to_string(),
        })
}

/// Parse ISO8601 duration string (PT1H2M3S, P1DT2H) to total seconds.
/// Missing components count as zero; anything malformed yields 0.
pub fn parse_iso8601_duration_to_seconds(duration_str: &str) -> u64 {
    let Some(duration_part) = duration_str.strip_prefix('P') else {
        if !duration_str.is_empty() {
            debug!("Unparseable duration {duration_str:?}, using 0");
        }
        return 0;
    };

    let mut total_seconds: u64 = 0;
    let mut current_number = String::new();
    let mut in_time_part = false;

    for ch in duration_part.chars() {
        if ch.is_ascii_digit() {
            current_number.push(ch);
            continue;
        }
        if ch == 'T' && !in_time_part && current_number.is_empty() {
            in_time_part = true;
            continue;
        }

        let Ok(num) = current_number.parse::<u64>() else {
            debug!("Unparseable duration {duration_str:?}, using 0");
            return 0;
        };
        current_number.clear();

        let unit_seconds = match (in_time_part, ch) {
            (false, 'W') => 7 * 86_400,
            (false, 'D') => 86_400,
            (true, 'H') => 3600,
            (true, 'M') => 60,
            (true, 'S') => 1,
            _ => {
                debug!("Unparseable duration {duration_str:?}, using 0");
                return 0;
            }
        };
        total_seconds = total_seconds.saturating_add(num.saturating_mul(unit_seconds));
    }

    if !current_number.is_empty() {
        debug!("Unparseable duration {duration_str:?}, using 0");
        return 0;
    }

    total_seconds
}

/// Read a provider counter. The Data API sends counts as decimal strings;
/// absent or garbled values are treated as zero.
pub fn parse_count(value: &Value) -> u64 {
    match value {
        Value::String(s) => s.parse().unwrap_or(0),
        Value::Number(n) => n.as_u64().unwrap_or(0),
        _ => 0,
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://youtube.com/watch?v={video_id}")
}

pub fn extract_youtube_video_id(url: &str) -> Option<String> {
    if let Some(captures) = regex::Regex::new(
        r"(?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/)([a-zA-Z0-9_-]{11})",
    )
    .ok()?
    .captures(url)
    {
        return captures.get(1).map(|m| m.as_str().to_string());
    }
    None
}

/// Accepts either a bare 11 character video id or any supported YouTube URL.
pub fn resolve_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    let is_bare_id = input.len() == 11
        && input
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if is_bare_id {
        Some(input.to_string())
    } else {
        extract_youtube_video_id(input)
    }
}

use rocket::http::Status;

use crate::models::{ErrorResponse, UsageKind};

/// Provider `error.errors[].reason` values that mean the daily quota is gone.
const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded"];

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("YouTube API quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("YouTube API returned {status} ({reason}): {message}")]
    Api {
        status: u16,
        reason: String,
        message: String,
    },

    #[error("Request to YouTube API failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("YOUTUBE_API_KEY is not configured")]
    MissingApiKey,

    #[error("Malformed YouTube API response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Builds the error for a non-success response, picking out the quota case.
    pub fn from_response(status: u16, body: &serde_json::Value) -> Self {
        let error = &body["error"];
        let message = error["message"]
            .as_str()
            .unwrap_or("no error message")
            .to_string();

        let reasons: Vec<&str> = error["errors"]
            .as_array()
            .map(|errors| errors.iter().filter_map(|e| e["reason"].as_str()).collect())
            .unwrap_or_default();

        if status == 403 && reasons.iter().any(|r| QUOTA_REASONS.contains(r)) {
            return ProviderError::QuotaExceeded(message);
        }

        ProviderError::Api {
            status,
            reason: reasons.first().unwrap_or(&"unknown").to_string(),
            message,
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, ProviderError::QuotaExceeded(_))
    }

    pub fn status(&self) -> Status {
        match self {
            ProviderError::QuotaExceeded(_) => Status::TooManyRequests,
            ProviderError::MissingApiKey => Status::ServiceUnavailable,
            ProviderError::Api { .. } | ProviderError::Transport(_) | ProviderError::Malformed(_) => {
                Status::BadGateway
            }
        }
    }
}

impl From<ProviderError> for ErrorResponse {
    fn from(e: ProviderError) -> Self {
        let error = match &e {
            ProviderError::QuotaExceeded(_) => "quota_exceeded",
            ProviderError::MissingApiKey => "missing_api_key",
            _ => "provider_error",
        };
        ErrorResponse::new(e.status(), error, e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Search keyword must not be empty")]
    EmptyKeyword,

    #[error("Target count must be at least 1")]
    ZeroTargetCount,

    #[error("published_after must not be later than published_before")]
    InvertedDateRange,

    #[error("Invalid value for {field}: {value}")]
    InvalidParameter { field: &'static str, value: String },
}

impl From<QueryError> for ErrorResponse {
    fn from(e: QueryError) -> Self {
        ErrorResponse::new(Status::BadRequest, "invalid_query", e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Daily {kind} limit of {limit} reached; it resets at midnight")]
pub struct UsageLimitReached {
    pub kind: UsageKind,
    pub limit: u32,
}

impl From<UsageLimitReached> for ErrorResponse {
    fn from(e: UsageLimitReached) -> Self {
        ErrorResponse::new(Status::TooManyRequests, "usage_limit", e.to_string())
    }
}

/// Failure of a search request before or during pagination.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Usage(#[from] UsageLimitReached),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<SearchError> for ErrorResponse {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::Usage(e) => e.into(),
            SearchError::Provider(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quota_reason_on_403_is_quota_exceeded() {
        let body = json!({
            "error": {
                "code": 403,
                "message": "The request cannot be completed because you have exceeded your quota.",
                "errors": [{ "reason": "quotaExceeded", "domain": "youtube.quota" }]
            }
        });

        let err = ProviderError::from_response(403, &body);
        assert!(err.is_quota_exceeded());
        assert_eq!(err.status(), Status::TooManyRequests);
    }

    #[test]
    fn other_403_is_generic_api_error() {
        let body = json!({
            "error": {
                "message": "API key not valid.",
                "errors": [{ "reason": "forbidden" }]
            }
        });

        match ProviderError::from_response(403, &body) {
            ProviderError::Api { status, reason, .. } => {
                assert_eq!(status, 403);
                assert_eq!(reason, "forbidden");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn quota_reason_with_other_status_is_not_quota() {
        let body = json!({ "error": { "errors": [{ "reason": "quotaExceeded" }] } });
        assert!(!ProviderError::from_response(500, &body).is_quota_exceeded());
    }

    #[test]
    fn missing_error_body_still_classifies() {
        match ProviderError::from_response(500, &serde_json::Value::Null) {
            ProviderError::Api { reason, message, .. } => {
                assert_eq!(reason, "unknown");
                assert_eq!(message, "no error message");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn usage_limit_is_too_many_requests() {
        let response = ErrorResponse::from(SearchError::from(UsageLimitReached {
            kind: UsageKind::Search,
            limit: 10,
        }));
        assert_eq!(response.status, Status::TooManyRequests);
        assert_eq!(response.error, "usage_limit");
        assert!(response.message.contains("search limit of 10"));
    }
}

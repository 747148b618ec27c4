use crate::models::{Comment, ErrorResponse, TranscriptResponse};
use crate::services::comments::fetch_comments;
use crate::services::transcript::TranscriptOutcome;
use crate::utils::resolve_video_id;
use crate::AppState;
use log::{error, info};
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, State};

fn video_id_or_400(video: &str) -> Result<String, ErrorResponse> {
    resolve_video_id(video).ok_or_else(|| {
        ErrorResponse::new(
            Status::BadRequest,
            "invalid_video",
            format!("Not a YouTube video id or URL: {video}"),
        )
    })
}

#[get("/transcript?<video>")]
pub async fn get_transcript(
    video: &str,
    state: &State<AppState>,
) -> Result<Json<TranscriptResponse>, ErrorResponse> {
    let video_id = video_id_or_400(video)?;

    let response = match state.transcripts.transcript(&video_id).await {
        TranscriptOutcome::Text { text, cached } => TranscriptResponse {
            video_id,
            text: Some(text),
            cached,
            retry_after_secs: None,
            error: None,
        },
        TranscriptOutcome::RateLimited { retry_after } => TranscriptResponse {
            video_id,
            text: None,
            cached: false,
            // round up so clients never retry a moment too early
            retry_after_secs: Some(retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0)),
            error: Some("Transcript requests are rate limited".to_string()),
        },
        TranscriptOutcome::LimitReached(limit) => return Err(limit.into()),
        TranscriptOutcome::Unavailable { reason } => TranscriptResponse {
            video_id,
            text: None,
            cached: false,
            retry_after_secs: None,
            error: Some(reason),
        },
    };

    Ok(Json(response))
}

#[get("/comments?<video>")]
pub async fn get_comments(
    video: &str,
    state: &State<AppState>,
) -> Result<Json<Vec<Comment>>, ErrorResponse> {
    let video_id = video_id_or_400(video)?;

    match fetch_comments(
        state.provider.as_ref(),
        &video_id,
        state.config.comment_max_pages,
    )
    .await
    {
        Ok(comments) => {
            info!("Returning {} comments for {video_id}", comments.len());
            Ok(Json(comments))
        }
        Err(e) => {
            error!("Failed to fetch comments for {video_id}: {e}");
            Err(e.into())
        }
    }
}

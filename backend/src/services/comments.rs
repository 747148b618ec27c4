use log::info;

use crate::errors::ProviderError;
use crate::models::Comment;
use crate::services::youtube::VideoProvider;

/// Pages through a video's comment threads (replies flattened in) and
/// returns them most-liked first. Stops after `max_pages` pages.
pub async fn fetch_comments(
    provider: &dyn VideoProvider,
    video_id: &str,
    max_pages: usize,
) -> Result<Vec<Comment>, ProviderError> {
    let mut all_comments = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0;

    while pages < max_pages {
        let page = provider
            .comment_threads(video_id, page_token.as_deref())
            .await?;
        all_comments.extend(page.comments);
        pages += 1;

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    all_comments.sort_by(|a, b| b.like_count.cmp(&a.like_count));
    info!(
        "Fetched {} comments for video {video_id} over {pages} pages",
        all_comments.len()
    );
    Ok(all_comments)
}

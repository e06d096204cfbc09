use crier_chat::PostCard;
use crier_social::Post;

/// Public web origin used for permalinks. The API host differs, so this is
/// kept separate from the fetch layer's base URL.
pub const FEED_PUBLIC_BASE: &str = "https://twitter.com";

/// Public web URL for one post.
///
/// ```
/// use crier_monitor::permalink;
///
/// assert_eq!(permalink("alpha", "6"), "https://twitter.com/alpha/status/6");
/// ```
pub fn permalink(handle: &str, post_id: &str) -> String {
    format!("{FEED_PUBLIC_BASE}/{handle}/status/{post_id}")
}

/// Render one post as the card the chat layer displays. Pure.
///
/// `handle` is the configured handle for the monitored account, not whatever
/// author expansion the fetch carried, so permalinks stay correct even when
/// the feed response omits user data.
pub fn format_post(handle: &str, post: &Post) -> PostCard {
    PostCard {
        title: format!("New tweet from @{handle}"),
        body: post.text.clone(),
        permalink: permalink(handle, &post.id),
        author: format!("@{handle}"),
        timestamp: post.created_at,
    }
}

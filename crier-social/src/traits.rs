use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crier_http::HttpError;
use serde::{Deserialize, Serialize};

/// One post as the monitor sees it, already lifted out of the wire format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: String,
    pub text: String,
    /// Absent when the feed did not return a creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Username of the post author; falls back to the raw author id when the
    /// feed response carries no user expansion.
    pub author_handle: String,
}

#[derive(thiserror::Error, Debug)]
pub enum FeedError {
    #[error("account not found: {0}")]
    NotFound(String),

    #[error("feed rate limited, retry_after_secs={retry_after_secs:?}")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("feed transport error: {0}")]
    Transport(String),

    #[error("feed response decode error: {0}")]
    Decode(String),

    #[error("feed configuration error: {0}")]
    Config(String),
}

impl From<HttpError> for FeedError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::RateLimited {
                retry_after_secs, ..
            } => Self::RateLimited { retry_after_secs },
            HttpError::Decode(msg, _) => Self::Decode(msg),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Read access to the remote feed. All implementations must be cheap to share
/// behind an `Arc` and safe to call from a single long-lived task.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Resolve a handle (username) to the feed's internal account id.
    async fn resolve_account_id(&self, handle: &str) -> Result<String, FeedError>;

    /// Most recent posts for an account, newest first, capped at `page_size`.
    /// When `since_id` is set only posts strictly newer than that id are
    /// returned; when it is `None` the feed serves its most recent page.
    async fn posts_since(
        &self,
        account_id: &str,
        since_id: Option<&str>,
        page_size: u32,
    ) -> Result<Vec<Post>, FeedError>;
}

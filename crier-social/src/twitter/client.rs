//! Wrapper around the Twitter/X v2 user-lookup and user-timeline endpoints.
//!
//! Data-path requests run with a retry budget of zero so a 429 surfaces to
//! the caller as [`FeedError::RateLimited`] instead of being absorbed here;
//! the monitor owns the decision to back off until the next cycle.
use std::borrow::Cow;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use crier_http::{Auth, HttpClient, RequestOpts, sanitize_token};

use crate::traits::{FeedClient, FeedError, Post};
use crate::twitter::types::{TimelineResponse, UserLookupResponse};

const TWITTER_API_BASE: &str = "https://api.twitter.com";

// /2/users/{id}/tweets accepts max_results in this window.
const MIN_PAGE: u32 = 5;
const MAX_PAGE: u32 = 100;

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    bearer: String,
}

impl TwitterApi {
    /// Build a client against the public API host. The token is checked for
    /// header-safety here so a broken secret fails at startup, not mid-cycle.
    pub fn new(bearer_token: &str) -> Result<Self, FeedError> {
        Self::with_base_url(bearer_token, TWITTER_API_BASE)
    }

    /// Same as [`TwitterApi::new`] with an explicit base URL (tests point
    /// this at a local mock server).
    pub fn with_base_url(bearer_token: &str, base_url: &str) -> Result<Self, FeedError> {
        let bearer = sanitize_token(bearer_token).map_err(|e| FeedError::Config(e.to_string()))?;
        let http = HttpClient::new(base_url).map_err(|e| FeedError::Config(e.to_string()))?;
        Ok(Self { http, bearer })
    }
}

#[async_trait::async_trait]
impl FeedClient for TwitterApi {
    async fn resolve_account_id(&self, handle: &str) -> Result<String, FeedError> {
        let path = format!("2/users/by/username/{handle}");
        let resp: UserLookupResponse = self
            .http
            .get_json(
                &path,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.bearer)),
                    retries: Some(0),
                    ..Default::default()
                },
            )
            .await?;

        match resp.data {
            Some(user) => {
                tracing::debug!(handle, id = %user.id, "feed.user_resolved");
                Ok(user.id)
            }
            None => {
                // The API answers 200 with an errors array for unknown users.
                let detail = resp
                    .errors
                    .as_ref()
                    .and_then(|errs| errs.first())
                    .and_then(|issue| issue.detail.clone())
                    .unwrap_or_default();
                tracing::debug!(handle, detail = %detail, "feed.user_missing");
                Err(FeedError::NotFound(handle.to_string()))
            }
        }
    }

    async fn posts_since(
        &self,
        account_id: &str,
        since_id: Option<&str>,
        page_size: u32,
    ) -> Result<Vec<Post>, FeedError> {
        let max_results = page_size.clamp(MIN_PAGE, MAX_PAGE);
        let mut params: Vec<(&str, Cow<'_, str>)> = vec![
            ("max_results", max_results.to_string().into()),
            ("tweet.fields", "created_at".into()),
            ("expansions", "author_id".into()),
            ("user.fields", "username".into()),
        ];
        if let Some(since) = since_id {
            params.push(("since_id", since.into()));
        }

        let path = format!("2/users/{account_id}/tweets");
        let resp: TimelineResponse = self
            .http
            .get_json(
                &path,
                RequestOpts {
                    auth: Some(Auth::Bearer(&self.bearer)),
                    query: Some(params),
                    retries: Some(0),
                    ..Default::default()
                },
            )
            .await?;

        let usernames: HashMap<&str, &str> = resp
            .includes
            .as_ref()
            .and_then(|inc| inc.users.as_ref())
            .map(|users| {
                users
                    .iter()
                    .map(|u| (u.id.as_str(), u.username.as_str()))
                    .collect()
            })
            .unwrap_or_default();

        let posts: Vec<Post> = resp
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|tweet| {
                let author_handle = tweet
                    .author_id
                    .as_deref()
                    .map(|id| usernames.get(id).copied().unwrap_or(id).to_string())
                    .unwrap_or_default();
                Post {
                    id: tweet.id,
                    text: tweet.text,
                    created_at: tweet.created_at.as_deref().and_then(parse_timestamp),
                    author_handle,
                }
            })
            .collect();

        tracing::debug!(
            account_id,
            since_id = ?since_id,
            returned = posts.len(),
            result_count = ?resp.meta.as_ref().and_then(|m| m.result_count),
            newest_id = ?resp.meta.as_ref().and_then(|m| m.newest_id.as_deref()),
            "feed.timeline"
        );
        Ok(posts)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

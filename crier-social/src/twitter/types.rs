use serde::{Deserialize, Serialize};

/// Response of `GET /2/users/by/username/{username}`. The API reports a
/// missing user with HTTP 200 and an `errors` array instead of `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLookupResponse {
    pub data: Option<UserObject>,
    #[serde(default)]
    pub errors: Option<Vec<ApiIssue>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserObject {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Response of `GET /2/users/{id}/tweets`. `data` is newest-first and absent
/// entirely when nothing matched the query window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineResponse {
    pub data: Option<Vec<TweetObject>>,
    #[serde(default)]
    pub includes: Option<Includes>,
    #[serde(default)]
    pub meta: Option<TimelineMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TweetObject {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Includes {
    #[serde(default)]
    pub users: Option<Vec<UserObject>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TimelineMeta {
    #[serde(default)]
    pub result_count: Option<u32>,
    #[serde(default)]
    pub newest_id: Option<String>,
    #[serde(default)]
    pub oldest_id: Option<String>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiIssue {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

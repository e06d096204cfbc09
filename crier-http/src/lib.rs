//! Shared HTTP client for the feed and chat adapters.
//!
//! One [`HttpClient`] is bound to one API base URL. Calls go through
//! [`HttpClient::get_json`] and [`HttpClient::post_json`], which retry
//! transient failures (connect errors, 5xx, 429) with exponential backoff,
//! honor `Retry-After`, and decode the JSON body into the caller's type.
//! A 429 that outlives its retry budget surfaces as
//! [`HttpError::RateLimited`] so callers can park the affected account
//! instead of failing the whole poll cycle.
//!
//! Tokens pass through [`sanitize_token`] before they reach a header, and
//! query strings are masked in logs when a parameter name looks like a
//! credential.
//!
//! ```no_run
//! # async fn run() -> Result<(), crier_http::HttpError> {
//! let api = crier_http::HttpClient::new("https://api.example.com")?.with_retries(1);
//! let profile: serde_json::Value = api
//!     .get_json("v1/profile", crier_http::RequestOpts::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::borrow::Cow;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

// Callers match on status codes and build `Auth::Header` values without
// naming reqwest themselves.
pub use reqwest::StatusCode;
pub use reqwest::header;

/// Longest body excerpt carried in errors and logs.
const SNIPPET_LIMIT: usize = 500;

/// First retry delay; doubles per attempt.
const BACKOFF_FLOOR: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum HttpError {
    /// The base URL or a joined path failed to parse.
    #[error("bad url: {0}")]
    Url(String),

    /// Client construction failed or credential material was unusable.
    #[error("client setup: {0}")]
    Build(String),

    /// Connect, TLS, timeout, or mid-body transport failure.
    #[error("transport: {0}")]
    Network(String),

    /// A 2xx response whose body did not match the expected shape. The
    /// second field is a body excerpt for the logs.
    #[error("undecodable body: {0}")]
    Decode(String, String),

    /// A 429 that survived every retry.
    #[error("rate limited, retry after {retry_after_secs:?}s (request {request_id})")]
    RateLimited {
        retry_after_secs: Option<u64>,
        request_id: String,
    },

    /// Any other non-success status.
    #[error("{status}: {message} (request {request_id})")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

/// Credential attached to a single request.
///
/// ```
/// use crier_http::Auth;
///
/// let auth = Auth::Bearer("tok");
/// assert!(matches!(auth, Auth::Bearer("tok")));
/// ```
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// `Authorization: Bearer <token>`; the token is sanitized first.
    Bearer(&'a str),
    /// A literal header, e.g. the chat API's `Authorization: Bot <token>`.
    Header { name: HeaderName, value: HeaderValue },
    /// Explicitly unauthenticated.
    None,
}

/// Per-call knobs layered over the client defaults.
///
/// ```
/// use std::time::Duration;
/// use crier_http::RequestOpts;
///
/// let opts = RequestOpts {
///     timeout: Some(Duration::from_secs(5)),
///     retries: Some(0),
///     ..Default::default()
/// };
/// assert!(opts.auth.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    /// Whole-request deadline; falls back to the client default.
    pub timeout: Option<Duration>,
    /// Retry budget for this call; `Some(0)` makes 429/5xx surface
    /// immediately.
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    /// Extra headers merged into the request.
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

/// What one attempt produced, as seen by the retry loop.
enum Step {
    /// 2xx; hand the body to the decoder.
    Deliver(Vec<u8>),
    /// Transient failure. Retried while budget remains; past that, `err` is
    /// what the caller sees.
    Again { wait: Duration, err: HttpError },
    /// Not worth retrying.
    Halt(HttpError),
}

/// JSON-over-HTTP client pinned to a single API base.
#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// ```no_run
    /// use crier_http::{HttpClient, HttpError};
    ///
    /// let api = HttpClient::new("https://api.example.com")?;
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// ```no_run
    /// use crier_http::{HttpClient, HttpError};
    ///
    /// let api = HttpClient::new("https://api.example.com")?.with_retries(0);
    /// assert_eq!(api.max_retries, 0);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    /// GET `path` (joined onto the base URL) and decode the JSON body.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.dispatch(Method::GET, path, None::<&()>, opts).await
    }

    /// POST `body` as JSON to `path` and decode the JSON response.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.dispatch(Method::POST, path, Some(body), opts).await
    }

    /// Attempt loop. A budget of N retries means at most N+1 attempts; once
    /// the budget is gone the last attempt's error is returned as-is.
    async fn dispatch<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(format!("{path}: {e}")))?;
        let budget = opts.retries.unwrap_or(self.max_retries);
        let call = Uuid::new_v4();
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match self
                .roundtrip(call, attempt, &method, &url, body, &opts)
                .await
            {
                Step::Deliver(bytes) => {
                    return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                        let snippet = snippet_of(&bytes);
                        tracing::warn!(
                            call = %call,
                            error = %e,
                            body = %snippet,
                            "http.decode_failed"
                        );
                        HttpError::Decode(e.to_string(), snippet)
                    });
                }
                Step::Again { wait, err } => {
                    if attempt > budget {
                        tracing::warn!(
                            call = %call,
                            attempts = attempt,
                            error = %err,
                            "http.gave_up"
                        );
                        return Err(err);
                    }
                    tracing::warn!(
                        call = %call,
                        attempt,
                        budget,
                        wait_ms = wait.as_millis() as u64,
                        error = %err,
                        "http.retry"
                    );
                    tokio::time::sleep(wait).await;
                }
                Step::Halt(err) => {
                    tracing::warn!(call = %call, error = %err, "http.failed");
                    return Err(err);
                }
            }
        }
    }

    /// One wire exchange, classified for the retry loop. Never sleeps.
    async fn roundtrip<B>(
        &self,
        call: Uuid,
        attempt: usize,
        method: &Method,
        url: &Url,
        body: Option<&B>,
        opts: &RequestOpts<'_>,
    ) -> Step
    where
        B: Serialize + ?Sized,
    {
        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(opts.timeout.unwrap_or(self.default_timeout));
        if let Some(query) = &opts.query {
            rb = rb.query(query);
        }
        if let Some(extra) = &opts.headers {
            rb = rb.headers(extra.clone());
        }
        if let Some(b) = body {
            rb = rb.json(b);
        }
        rb = match &opts.auth {
            Some(Auth::Bearer(raw)) => match sanitize_token(raw) {
                Ok(token) => rb.bearer_auth(token),
                Err(e) => return Step::Halt(e),
            },
            Some(Auth::Header { name, value }) => rb.header(name.clone(), value.clone()),
            Some(Auth::None) | None => rb,
        };

        let auth_kind = match &opts.auth {
            Some(Auth::Bearer(_)) => "bearer",
            Some(Auth::Header { .. }) => "header",
            Some(Auth::None) | None => "anon",
        };
        tracing::debug!(
            call = %call,
            attempt,
            method = %method,
            path = url.path(),
            query = %describe_query(opts),
            auth = auth_kind,
            "http.request"
        );

        let started = Instant::now();
        let response = match rb.send().await {
            Ok(r) => r,
            Err(e) => {
                return Step::Again {
                    wait: backoff_for(attempt),
                    err: HttpError::Network(e.to_string()),
                };
            }
        };

        let status = response.status();
        let headers = response.headers().clone();
        let request_id = remote_id(&headers);
        let bytes = match response.bytes().await {
            Ok(b) => b.to_vec(),
            Err(e) => {
                return Step::Again {
                    wait: backoff_for(attempt),
                    err: HttpError::Network(format!("body read: {e}")),
                };
            }
        };

        tracing::debug!(
            call = %call,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            bytes = bytes.len(),
            remaining = ?rate_limit_remaining(&headers),
            id = %request_id,
            "http.response"
        );

        if status.is_success() {
            return Step::Deliver(bytes);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let hint = retry_after_hint(&headers);
            // Without a Retry-After hint, wait out at least a full second.
            let wait = hint
                .map(Duration::from_secs)
                .unwrap_or_else(|| backoff_for(attempt).max(Duration::from_millis(1100)));
            return Step::Again {
                wait,
                err: HttpError::RateLimited {
                    retry_after_secs: hint,
                    request_id,
                },
            };
        }

        let message = error_summary(&bytes);
        if status.is_server_error() {
            let wait = retry_after_hint(&headers)
                .map(Duration::from_secs)
                .unwrap_or_else(|| backoff_for(attempt));
            return Step::Again {
                wait,
                err: HttpError::Api {
                    status,
                    message,
                    request_id,
                },
            };
        }

        Step::Halt(HttpError::Api {
            status,
            message,
            request_id,
        })
    }
}

/// Render the query for logs, masking values whose key names a credential.
fn describe_query(opts: &RequestOpts<'_>) -> String {
    let Some(query) = &opts.query else {
        return String::new();
    };
    let mut out = String::new();
    for (key, value) in query {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(key);
        out.push('=');
        if is_sensitive_param(key) {
            out.push_str("<masked>");
        } else {
            out.push_str(value);
        }
    }
    out
}

fn is_sensitive_param(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "access_token"
            | "authorization"
            | "auth"
            | "key"
            | "api_key"
            | "token"
            | "secret"
            | "client_secret"
            | "bearer"
    )
}

/// Server-supplied `Retry-After`, whole seconds only.
fn retry_after_hint(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

fn backoff_for(attempt: usize) -> Duration {
    let exp = attempt.saturating_sub(1).min(6) as u32;
    BACKOFF_FLOOR.saturating_mul(1 << exp)
}

/// Correlation id advertised by the server, for joining our logs to theirs.
fn remote_id(headers: &HeaderMap) -> String {
    for name in ["x-request-id", "x-correlation-id"] {
        if let Some(v) = headers.get(name).and_then(|v| v.to_str().ok()) {
            if !v.is_empty() {
                return v.to_string();
            }
        }
    }
    "-".into()
}

/// Remaining request allowance, under either spelling the two APIs use.
fn rate_limit_remaining(headers: &HeaderMap) -> Option<i64> {
    ["x-rate-limit-remaining", "x-ratelimit-remaining"]
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
}

/// Pick the most useful human-readable line out of an error body.
///
/// The feed API wraps failures in an `errors` array; the chat API sends one
/// object with `message` and a vendor `code`. Anything else falls back to a
/// raw body snippet.
fn error_summary(body: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
        return snippet_of(body);
    };
    let source = value.get("errors").and_then(|e| e.get(0)).unwrap_or(&value);
    let text = ["message", "detail", "title", "error"].iter().find_map(|k| {
        source
            .get(*k)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    });
    match text {
        Some(msg) => match value.get("code").and_then(|c| c.as_i64()) {
            Some(code) => format!("{msg} (code {code})"),
            None => msg.to_string(),
        },
        None => snippet_of(body),
    }
}

/// Body excerpt for errors and logs, cut on a char boundary.
fn snippet_of(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() <= SNIPPET_LIMIT {
        return text.into_owned();
    }
    let mut cut = SNIPPET_LIMIT;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}

/// Normalize a configured secret before it goes into a header.
///
/// Values pasted from env files arrive with surrounding quotes, stray
/// whitespace, or a trailing newline; all of that is stripped. Anything
/// left that cannot appear in an `Authorization` header is rejected rather
/// than sent.
pub fn sanitize_token(raw: &str) -> Result<String, HttpError> {
    let trimmed = raw.trim().trim_matches(|c| c == '"' || c == '\'');
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(HttpError::Build("empty credential".into()));
    }
    if !cleaned.is_ascii() {
        return Err(HttpError::Build(
            "credential contains non-ASCII bytes".into(),
        ));
    }
    if cleaned.chars().any(|c| c.is_ascii_control()) {
        return Err(HttpError::Build(
            "credential contains control characters".into(),
        ));
    }
    Ok(cleaned)
}

//! Discord REST client: identity probe, channel lookup, message create.
//!
//! Delivery requests run with a retry budget of zero; retrying a message
//! create after an ambiguous network failure could double-post. The startup
//! identity probe keeps the client's default budget (idempotent GET).
use std::sync::atomic::{AtomicBool, Ordering};

use crier_http::header::{AUTHORIZATION, HeaderValue};
use crier_http::{Auth, HttpClient, HttpError, RequestOpts, StatusCode, sanitize_token};

use crate::discord::types::{BotUser, ChannelObject, CreateMessage, Embed, MessageObject};
use crate::traits::{ChannelId, ChatClient, ChatError, Destination, PostCard};

// Trailing slash matters: keeps relative joins under /api/v10.
const DISCORD_API_BASE: &str = "https://discord.com/api/v10/";

pub struct DiscordApi {
    http: HttpClient,
    auth: HeaderValue,
    ready: AtomicBool,
}

impl DiscordApi {
    /// Build a client against the public API host. The token is validated
    /// and baked into an `Authorization: Bot …` header here.
    pub fn new(bot_token: &str) -> Result<Self, ChatError> {
        Self::with_base_url(bot_token, DISCORD_API_BASE)
    }

    /// Same as [`DiscordApi::new`] with an explicit base URL (tests point
    /// this at a local mock server).
    pub fn with_base_url(bot_token: &str, base_url: &str) -> Result<Self, ChatError> {
        let token = sanitize_token(bot_token).map_err(|e| ChatError::Config(e.to_string()))?;
        let mut auth = HeaderValue::from_str(&format!("Bot {token}"))
            .map_err(|e| ChatError::Config(format!("invalid Authorization header: {e}")))?;
        auth.set_sensitive(true);
        let http = HttpClient::new(base_url).map_err(|e| ChatError::Config(e.to_string()))?;
        Ok(Self {
            http,
            auth,
            ready: AtomicBool::new(false),
        })
    }

    fn auth(&self) -> Auth<'_> {
        Auth::Header {
            name: AUTHORIZATION,
            value: self.auth.clone(),
        }
    }

    /// Verify the token against `/users/@me` and flip the readiness flag.
    /// The monitor skips its cycle body until this has succeeded once.
    pub async fn connect(&self) -> Result<BotUser, ChatError> {
        let me: BotUser = self
            .http
            .get_json(
                "users/@me",
                RequestOpts {
                    auth: Some(self.auth()),
                    ..Default::default()
                },
            )
            .await
            .map_err(classify)?;

        self.ready.store(true, Ordering::SeqCst);
        tracing::info!(bot = %me.username, id = %me.id, "chat.ready");
        Ok(me)
    }
}

#[async_trait::async_trait]
impl ChatClient for DiscordApi {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn fetch_destination(&self, id: ChannelId) -> Result<Destination, ChatError> {
        let path = format!("channels/{id}");
        let channel: ChannelObject = self
            .http
            .get_json(
                &path,
                RequestOpts {
                    auth: Some(self.auth()),
                    retries: Some(0),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| match e {
                HttpError::Api { status, .. } if status == StatusCode::NOT_FOUND => {
                    ChatError::NotFound(id)
                }
                other => classify(other),
            })?;

        let name = channel.name.unwrap_or_else(|| "unknown".to_string());
        tracing::debug!(channel = %id, name = %name, "chat.channel_fetched");
        Ok(Destination { id, name })
    }

    async fn send(&self, destination: &Destination, card: &PostCard) -> Result<(), ChatError> {
        let path = format!("channels/{}/messages", destination.id);
        let body = CreateMessage {
            embeds: vec![Embed::from(card)],
        };
        let message: MessageObject = self
            .http
            .post_json(
                &path,
                &body,
                RequestOpts {
                    auth: Some(self.auth()),
                    retries: Some(0),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| match e {
                HttpError::Api { status, .. } if status == StatusCode::NOT_FOUND => {
                    ChatError::NotFound(destination.id)
                }
                other => classify(other),
            })?;

        tracing::debug!(
            channel = %destination.id,
            message_id = %message.id,
            "chat.message_posted"
        );
        Ok(())
    }
}

fn classify(e: HttpError) -> ChatError {
    match e {
        HttpError::RateLimited {
            retry_after_secs, ..
        } => ChatError::RateLimited { retry_after_secs },
        HttpError::Api {
            status, message, ..
        } if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED => {
            ChatError::Forbidden(message)
        }
        HttpError::Decode(msg, _) => ChatError::Decode(msg),
        other => ChatError::Transport(other.to_string()),
    }
}

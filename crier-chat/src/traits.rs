use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric id of a chat channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A resolved, postable destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub id: ChannelId,
    pub name: String,
}

/// One rendered announcement, ready for the chat platform to display as a
/// rich card. Built by the monitor's formatter; this crate only renders it
/// into the platform's wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCard {
    pub title: String,
    pub body: String,
    pub permalink: String,
    /// Handle shown as the card author, already `@`-prefixed.
    pub author: String,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(thiserror::Error, Debug)]
pub enum ChatError {
    #[error("destination not found: {0}")]
    NotFound(ChannelId),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("chat rate limited, retry_after_secs={retry_after_secs:?}")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("chat transport error: {0}")]
    Transport(String),

    #[error("chat response decode error: {0}")]
    Decode(String),

    #[error("chat configuration error: {0}")]
    Config(String),
}

/// What the monitor needs from the chat platform. Implementations must be
/// shareable behind an `Arc`; readiness may be flipped from another task, so
/// it is a plain poll rather than a notification.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// True once the backing connection/auth handshake has succeeded.
    fn is_ready(&self) -> bool;

    /// Look a destination up by id. `NotFound` here is retryable from the
    /// monitor's point of view (next cycle), not fatal.
    async fn fetch_destination(&self, id: ChannelId) -> Result<Destination, ChatError>;

    /// Deliver one card to a destination.
    async fn send(&self, destination: &Destination, card: &PostCard) -> Result<(), ChatError>;
}

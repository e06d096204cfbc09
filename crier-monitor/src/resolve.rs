use std::sync::Arc;

use crier_chat::{ChannelId, ChatClient, ChatError, Destination};
use tracing::debug;

/// Cache-then-fetch lookup for the delivery destination.
///
/// The first successful fetch is kept for the life of the process; channels
/// are assumed stable, so the cache is never invalidated. A fetch failure
/// leaves the cache empty and the next call tries again.
pub struct DestinationResolver {
    chat: Arc<dyn ChatClient>,
    channel: ChannelId,
    cached: Option<Destination>,
}

impl DestinationResolver {
    pub fn new(chat: Arc<dyn ChatClient>, channel: ChannelId) -> Self {
        Self {
            chat,
            channel,
            cached: None,
        }
    }

    /// The configured destination, from cache when warm.
    pub async fn get(&mut self) -> Result<Destination, ChatError> {
        if let Some(dest) = &self.cached {
            return Ok(dest.clone());
        }
        let dest = self.chat.fetch_destination(self.channel).await?;
        debug!(channel = %self.channel, name = %dest.name, "destination.resolved");
        self.cached = Some(dest.clone());
        Ok(dest)
    }
}

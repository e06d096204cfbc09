//! Discord REST (API v10) integration.
//!
//! Plain REST, no gateway: the bot only posts into channels and never reads
//! events. `client` wraps the three endpoints in use; `types` holds the wire
//! models and the embed rendering.
pub mod client;
pub mod types;

pub use client::DiscordApi;

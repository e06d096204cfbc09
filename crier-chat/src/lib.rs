//! Chat-side client for crier.
//!
//! The monitor talks to the [`traits::ChatClient`] seam only; the one real
//! implementation is the Discord REST adapter in [`discord`]. Connection and
//! auth lifecycle stay inside this crate; the monitor just polls
//! `is_ready()` and hands over finished [`traits::PostCard`]s.
pub mod discord;
pub mod traits;

pub use discord::DiscordApi;
pub use traits::{ChannelId, ChatClient, ChatError, Destination, PostCard};

//! Twitter/X API v2 integration.
//!
//! `client` wraps the two endpoints the monitor needs (user lookup and user
//! timeline); `types` holds the strongly typed response models.
pub mod client;
pub mod types;

pub use client::TwitterApi;

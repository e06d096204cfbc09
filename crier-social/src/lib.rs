//! Feed-side clients for crier.
//!
//! Only the Twitter/X API v2 adapter exists today. The [`traits::FeedClient`]
//! seam is what the monitor consumes, so a different feed backend (or a test
//! fake) only has to implement that trait.
pub mod traits;
pub mod twitter;

pub use traits::{FeedClient, FeedError, Post};
pub use twitter::TwitterApi;

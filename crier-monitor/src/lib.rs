//! Poll-and-relay core: watches a set of feed accounts and forwards each new
//! post to one chat destination, at most once per post id.
//!
//! All state (cursors, resolved account ids, the destination cache) lives in
//! memory. A restart re-baselines from the feed's most recent page, so the
//! at-most-once guarantee is per process lifetime, not across restarts.
pub mod cursor;
pub mod filter;
pub mod format;
pub mod monitor;
pub mod resolve;

pub use cursor::CursorStore;
pub use filter::ContentFilter;
pub use format::{format_post, permalink};
pub use monitor::{CycleReport, Monitor, MonitorError, MonitorSettings};
pub use resolve::DestinationResolver;

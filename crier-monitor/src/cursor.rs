use std::collections::HashMap;

/// Last-processed post id per monitored handle.
///
/// A plain in-memory map and the single source of truth for "have we handled
/// this post before". The store does no ordering checks of its own: fetches
/// already apply the since-filter, so callers only ever pass ids newer than
/// the stored one. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct CursorStore {
    seen: HashMap<String, String>,
}

impl CursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor for a handle, or `None` if no post has been processed yet.
    /// `None` tells the fetch to request the most recent page unfiltered.
    ///
    /// ```
    /// use crier_monitor::CursorStore;
    ///
    /// let mut cursors = CursorStore::new();
    /// assert_eq!(cursors.get("alpha"), None);
    /// cursors.set("alpha", "100");
    /// cursors.set("alpha", "101");
    /// assert_eq!(cursors.get("alpha").as_deref(), Some("101"));
    /// ```
    pub fn get(&self, handle: &str) -> Option<String> {
        self.seen.get(handle).cloned()
    }

    pub fn set(&mut self, handle: &str, post_id: &str) {
        self.seen.insert(handle.to_string(), post_id.to_string());
    }

    /// Number of handles with a recorded cursor.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_handle_has_no_cursor() {
        let cursors = CursorStore::new();
        assert_eq!(cursors.get("alpha"), None);
        assert!(cursors.is_empty());
    }

    #[test]
    fn set_replaces_the_previous_cursor() {
        let mut cursors = CursorStore::new();
        cursors.set("alpha", "5");
        cursors.set("alpha", "6");
        assert_eq!(cursors.get("alpha").as_deref(), Some("6"));
        assert_eq!(cursors.len(), 1);
    }

    #[test]
    fn handles_track_independent_cursors() {
        let mut cursors = CursorStore::new();
        cursors.set("alpha", "5");
        cursors.set("beta", "900");
        assert_eq!(cursors.get("alpha").as_deref(), Some("5"));
        assert_eq!(cursors.get("beta").as_deref(), Some("900"));
        assert_eq!(cursors.len(), 2);
    }
}

/// Case-insensitive marker test deciding which posts are withheld.
///
/// The rule is a plain substring match, so the marker is found anywhere in
/// the text, hashtag or not.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    marker: String,
}

impl ContentFilter {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_lowercase(),
        }
    }

    /// True when the text carries the marker and the post must not be
    /// delivered. An excluded post still counts as processed upstream.
    ///
    /// ```
    /// use crier_monitor::ContentFilter;
    ///
    /// let filter = ContentFilter::new("#spoilersie");
    /// assert!(filter.excludes("half-time thoughts #SpoilersIE"));
    /// assert!(!filter.excludes("kick-off in ten"));
    /// ```
    pub fn excludes(&self, text: &str) -> bool {
        // An empty marker means no filtering rule is in force.
        if self.marker.is_empty() {
            return false;
        }
        text.to_lowercase().contains(&self.marker)
    }
}

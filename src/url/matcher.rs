use crate::config::ScannerConfig;
use crate::url::PageId;

/// Decides which discovered links belong to the crawl
///
/// A link is followed when it lies in the profile namespace and is not a
/// friends-listing link; friends pages are reached through pagination of
/// their owner instead.
#[derive(Debug, Clone)]
pub struct ProfileFilter {
    prefix: String,
    excluded: String,
}

impl ProfileFilter {
    /// Creates a filter from a namespace prefix and an excluded segment
    pub fn new(prefix: impl Into<String>, excluded: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            excluded: excluded.into(),
        }
    }

    /// Builds the filter described by the scanner configuration
    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(&config.profile_prefix, &config.excluded_segment)
    }

    /// Returns true if the identifier should be enqueued
    pub fn accepts(&self, id: &PageId) -> bool {
        let path = id.as_str();
        path.contains(&self.prefix) && (self.excluded.is_empty() || !path.contains(&self.excluded))
    }

    /// Converts an anchor href into an identifier if the filter accepts it
    pub fn candidate(&self, href: &str) -> Option<PageId> {
        PageId::from_href(href).filter(|id| self.accepts(id))
    }
}

impl Default for ProfileFilter {
    fn default() -> Self {
        Self::from_config(&ScannerConfig::default())
    }
}

use std::fmt;
use ::url::Url;

/// A request path identifying one user's pages
///
/// Identifiers are compared exactly as discovered; the only rewriting is
/// reducing an absolute `http(s)` link to its path and query, so that every
/// identifier can be placed straight into a request line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(String);

impl PageId {
    /// Creates an identifier from a path that is already rooted at `/`
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Converts an anchor `href` into an identifier
    ///
    /// # Returns
    ///
    /// * `Some(PageId)` - for root-relative paths and absolute http(s) URLs
    /// * `None` - for empty, fragment-only, relative or non-http links
    ///
    /// # Example
    ///
    /// ```
    /// use fakebook_crawler::url::PageId;
    ///
    /// let id = PageId::from_href("https://example.com/fakebook/42/").unwrap();
    /// assert_eq!(id.as_str(), "/fakebook/42/");
    /// assert!(PageId::from_href("mailto:someone@example.com").is_none());
    /// ```
    pub fn from_href(href: &str) -> Option<Self> {
        let href = href.trim();

        if href.starts_with('/') && !href.starts_with("//") {
            return Some(Self(href.to_string()));
        }

        if href.starts_with("http://") || href.starts_with("https://") {
            return Url::parse(href).ok().map(|url| Self(path_and_query(&url)));
        }

        None
    }

    /// Returns the identifier as a request path
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the `page`-th friends listing for this user
    pub fn friends_page(&self, page: u32) -> String {
        if self.0.ends_with('/') {
            format!("{}friends/{}/", self.0, page)
        } else {
            format!("{}/friends/{}/", self.0, page)
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reduces a parsed URL to the path (and query) used in a request line
pub fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

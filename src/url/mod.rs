//! Page identifiers and link filtering
//!
//! Every page the crawler visits is addressed by a request path. This module
//! turns anchor hrefs into those paths and decides which of them belong to
//! the profile namespace.

mod identifier;
mod matcher;

pub use identifier::{path_and_query, PageId};
pub use matcher::ProfileFilter;

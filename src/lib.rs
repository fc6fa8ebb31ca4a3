//! Fakebook crawler: a session-authenticated flag hunter
//!
//! This crate logs into a cookie-session site over a hand-rolled HTTP/1.1
//! client, walks the graph of profile and friends-list pages with a small
//! pool of workers, and stops as soon as every marked flag has been found.

pub mod config;
pub mod crawler;
pub mod http;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error: {0}")]
    Transport(#[from] http::TransportError),

    #[error("Markup scan failed for {id}: {source}")]
    Scan {
        id: String,
        source: crawler::ScanError,
    },

    #[error("Login failed: {0}")]
    Login(String),

    #[error("Redirect from {path} has no Location header")]
    MissingLocation { path: String },

    #[error("Too many redirects from {path}")]
    RedirectLimit { path: String },

    #[error("Gave up on {path} after {attempts} unavailable responses")]
    RetryLimit { path: String, attempts: u32 },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::crawler::{crawl, CrawlOutcome, CrawlReport};
pub use crate::url::PageId;

//! Configuration module for the crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; an absent file means all defaults.
//!
//! # Example
//!
//! ```no_run
//! use fakebook_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Crawling {}:{}", config.server.host, config.server.port);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, ScannerConfig, ServerConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;

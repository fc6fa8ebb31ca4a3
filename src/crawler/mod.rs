//! Crawler module for the authenticated flag hunt
//!
//! This module contains the core crawling logic, including:
//! - Status-driven fetching with redirect following and retries
//! - The login handshake
//! - Markup scanning for profile links and flags
//! - The deduplicated frontier
//! - Overall crawl coordination over a worker pool

mod coordinator;
mod fetcher;
mod parser;
mod scheduler;
mod session;

pub use coordinator::{Coordinator, CrawlOutcome, CrawlReport};
pub use fetcher::{classify, Disposition, Fetcher, Flow};
pub use parser::{
    markup_events, HtmlScanner, MarkupEvent, MarkupScanner, PayloadExtractor, ScanError,
    ScanOutput,
};
pub use scheduler::{Frontier, Requeue};
pub use session::{base_get, Session, SessionCredentials};

use crate::config::Config;
use crate::http::TcpTransport;
use crate::Result;
use std::sync::Arc;

/// Runs a complete crawl against the configured server
///
/// This is the main entry point. It will:
/// 1. Build the raw socket transport
/// 2. Log in with the given credentials
/// 3. Seed the frontier from the start page
/// 4. Run the worker pool until every flag is found or nothing is left
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `username` - Account name for the login form
/// * `password` - Account password
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl ended; see its outcome
/// * `Err(CrawlerError)` - Transport setup, login or seeding failed
///
/// # Example
///
/// ```no_run
/// use fakebook_crawler::config::load_config;
/// use fakebook_crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawler.toml"))?;
/// let report = crawl(config, "user", "secret").await?;
/// println!("{:?}", report.payloads);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config, username: &str, password: &str) -> Result<CrawlReport> {
    let transport = TcpTransport::new(&config.server, &config.crawler)?;
    tracing::info!(
        "Crawling {}:{} ({})",
        config.server.host,
        config.server.port,
        if config.server.tls { "TLS" } else { "plain" }
    );

    Coordinator::new(config, Arc::new(transport))
        .run(username, password)
        .await
}

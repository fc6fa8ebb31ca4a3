//! Fakebook crawler main entry point
//!
//! This is the command-line interface for the Fakebook flag crawler.

use clap::Parser;
use fakebook_crawler::config::{load_config, validate, Config};
use fakebook_crawler::crawler::crawl;
use fakebook_crawler::output::{configured_sinks, print_summary, write_all, CrawlSummary};
use fakebook_crawler::CrawlerError;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Fakebook crawler: logs in and hunts for secret flags
///
/// Walks the profile and friends pages of a Fakebook server with a small
/// pool of workers and writes every flag it finds, one per line.
#[derive(Parser, Debug)]
#[command(name = "fakebook-crawler")]
#[command(version = "1.0.0")]
#[command(about = "Concurrent Fakebook flag crawler", long_about = None)]
struct Cli {
    /// Account username
    #[arg(value_name = "USERNAME")]
    username: String,

    /// Account password
    #[arg(value_name = "PASSWORD")]
    password: String,

    /// Server host name
    #[arg(short, long, value_name = "HOST")]
    server: Option<String>,

    /// Server port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Connect without TLS (port defaults to 80)
    #[arg(long)]
    plain: bool,

    /// File the flags are written to
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    let sinks = configured_sinks(&config.output);

    let report = match crawl(config, &cli.username, &cli.password).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let summary = CrawlSummary::from_report(&report);
    if let Err(e) = write_all(&sinks, &summary).map_err(CrawlerError::from) {
        tracing::error!("Failed to write results: {}", e);
        return Err(e.into());
    }

    if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Loads the configuration file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> fakebook_crawler::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    if let Some(server) = &cli.server {
        config.server.host = server.clone();
    }
    if cli.plain {
        config.server.tls = false;
        if cli.port.is_none() && config.server.port == 443 {
            config.server.port = 80;
        }
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(output) = &cli.output {
        config.output.flags_path = output.to_string_lossy().into_owned();
    }

    validate(&config)?;
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fakebook_crawler=info,warn"),
            1 => EnvFilter::new("fakebook_crawler=debug,info"),
            2 => EnvFilter::new("fakebook_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

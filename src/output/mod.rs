//! Output module for persisting flags and reporting crawl results
//!
//! This module handles:
//! - Writing discovered flags to the flags file
//! - Generating markdown summaries of crawl results
//! - Printing the final console report

mod file_sink;
mod markdown;
pub mod stats;
mod traits;

pub use file_sink::FlagFileSink;
pub use markdown::{format_markdown_summary, generate_markdown_summary, MarkdownSink};
pub use stats::{format_elapsed, print_summary};
pub use traits::{CrawlSummary, OutputError, OutputResult, ResultSink};

use crate::config::OutputConfig;

/// Builds the sinks described by the output configuration
///
/// The flag file is always written; the markdown summary only when a path
/// is configured.
pub fn configured_sinks(config: &OutputConfig) -> Vec<Box<dyn ResultSink>> {
    let mut sinks: Vec<Box<dyn ResultSink>> = vec![Box::new(FlagFileSink::new(&config.flags_path))];
    if let Some(path) = &config.summary_path {
        sinks.push(Box::new(MarkdownSink::new(path)));
    }
    sinks
}

/// Hands the summary to every sink, stopping at the first failure
pub fn write_all(sinks: &[Box<dyn ResultSink>], summary: &CrawlSummary) -> OutputResult<()> {
    for sink in sinks {
        sink.write(summary)?;
    }
    Ok(())
}

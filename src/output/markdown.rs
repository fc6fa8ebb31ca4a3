//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of a crawl:
//! run information, counters, the flags found, and any pages whose markup
//! could not be scanned.

use crate::output::traits::{CrawlSummary, OutputResult, ResultSink};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Generates a markdown summary file
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Fakebook Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at));
    md.push_str(&format!(
        "- **Duration**: {} ({:.2} seconds)\n",
        summary.elapsed_display(),
        summary.elapsed_seconds
    ));
    md.push_str(&format!("- **Outcome**: {}\n\n", summary.outcome));

    // Counters
    md.push_str("## Statistics\n\n");
    md.push_str("| Counter | Value |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Pages visited | {} |\n", summary.pages_visited));
    md.push_str(&format!("| Users dispatched | {} |\n", summary.dispatched));
    md.push_str(&format!("| Users completed | {} |\n", summary.completed));
    md.push_str(&format!("| Users requeued | {} |\n", summary.requeued));
    md.push_str(&format!("| Users seen | {} |\n", summary.identifiers_seen));
    md.push_str(&format!(
        "| Users per second | {:.2} |\n\n",
        summary.users_per_second()
    ));

    // Flags
    md.push_str(&format!(
        "## Flags ({}/{})\n\n",
        summary.payloads.len(),
        summary.target
    ));
    if summary.payloads.is_empty() {
        md.push_str("No flags found.\n\n");
    } else {
        for flag in &summary.payloads {
            md.push_str(&format!("- `{}`\n", flag));
        }
        md.push('\n');
    }

    // Feed errors
    if !summary.feed_errors.is_empty() {
        md.push_str("## Scan Errors\n\n");
        for id in &summary.feed_errors {
            md.push_str(&format!("- {}\n", id));
        }
        md.push('\n');
    }

    md
}

/// Sink writing the markdown summary to a fixed path
#[derive(Debug, Clone)]
pub struct MarkdownSink {
    path: PathBuf,
}

impl MarkdownSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultSink for MarkdownSink {
    fn write(&self, summary: &CrawlSummary) -> OutputResult<()> {
        generate_markdown_summary(summary, &self.path)?;
        tracing::info!("Wrote crawl summary to {}", self.path.display());
        Ok(())
    }
}

//! Result sink trait and summary types
//!
//! This module defines the trait interface for result sinks and the
//! summary that is handed to them once a crawl ends.

use crate::crawler::CrawlReport;
use crate::output::stats::format_elapsed;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary of a finished crawl
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlSummary {
    // Run metadata
    pub started_at: String,
    pub finished_at: String,
    pub elapsed_seconds: f64,
    pub outcome: String,

    // Flags
    pub target: usize,
    pub payloads: Vec<String>,

    // Counters
    pub pages_visited: u64,
    pub dispatched: u64,
    pub completed: u64,
    pub requeued: u64,
    pub identifiers_seen: usize,

    // Identifiers whose markup failed to scan
    pub feed_errors: Vec<String>,
}

impl CrawlSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the summary handed to sinks from a crawl report
    pub fn from_report(report: &CrawlReport) -> Self {
        Self {
            started_at: report.started_at.to_rfc3339(),
            finished_at: report.finished_at.to_rfc3339(),
            elapsed_seconds: report.elapsed.as_secs_f64(),
            outcome: report.outcome.to_string(),
            target: report.target,
            payloads: report.payloads.clone(),
            pages_visited: report.counters.pages_visited,
            dispatched: report.counters.dispatched,
            completed: report.counters.completed,
            requeued: report.counters.requeued,
            identifiers_seen: report.identifiers_seen,
            feed_errors: report.feed_errors.iter().map(|id| id.to_string()).collect(),
        }
    }

    /// True if every flag was found
    pub fn is_complete(&self) -> bool {
        self.payloads.len() >= self.target
    }

    /// Elapsed time as `XmYs`
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_seconds)
    }

    /// Users completed per second over the whole run
    pub fn users_per_second(&self) -> f64 {
        if self.elapsed_seconds <= 0.0 {
            return 0.0;
        }
        self.completed as f64 / self.elapsed_seconds
    }
}

/// Persists the outcome of a crawl
///
/// A sink is called once, after the worker pool has stopped.
pub trait ResultSink {
    /// Writes the summary (and its flags) to the sink's destination
    fn write(&self, summary: &CrawlSummary) -> OutputResult<()>;
}

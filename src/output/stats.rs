//! Console summary of a finished crawl

use crate::output::traits::CrawlSummary;

/// Formats a duration in seconds as `XmYs`
///
/// # Example
///
/// ```
/// use fakebook_crawler::output::stats::format_elapsed;
///
/// assert_eq!(format_elapsed(125.4), "2m5s");
/// assert_eq!(format_elapsed(9.0), "0m9s");
/// ```
pub fn format_elapsed(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    format!("{}m{}s", total / 60, total % 60)
}

/// Prints the final report to stdout
///
/// # Arguments
///
/// * `summary` - The summary to display
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Time taken: {}", summary.elapsed_display());
    println!("Outcome: {}", summary.outcome);
    println!();

    println!("Overview:");
    println!("  Sites visited: {}", summary.pages_visited);
    println!("  Users completed: {}", summary.completed);
    println!("  Users seen: {}", summary.identifiers_seen);
    if summary.requeued > 0 {
        println!("  Users requeued after errors: {}", summary.requeued);
    }
    println!("  Rate: {:.2} users/sec", summary.users_per_second());
    println!();

    if !summary.feed_errors.is_empty() {
        println!("Error links ({}):", summary.feed_errors.len());
        for id in &summary.feed_errors {
            println!("  - {}", id);
        }
        println!();
    }

    println!("Flags ({}/{}):", summary.payloads.len(), summary.target);
    for flag in &summary.payloads {
        println!("  {}", flag);
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

/// Progress counters shared by all workers
///
/// Only used for reporting; nothing in the crawl depends on their values.
#[derive(Debug, Default)]
pub struct VisitCounters {
    pages_visited: AtomicU64,
    dispatched: AtomicU64,
    completed: AtomicU64,
    requeued: AtomicU64,
}

/// Point-in-time copy of [`VisitCounters`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Individual page fetches (home pages and friends pages)
    pub pages_visited: u64,

    /// Identifiers handed to a worker
    pub dispatched: u64,

    /// Identifiers whose home page and every friends page were processed
    pub completed: u64,

    /// Identifiers put back on the frontier after a failure
    pub requeued: u64,
}

impl VisitCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_visited(&self) {
        self.pages_visited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a finished identifier and returns the new completed total
    pub fn completed(&self) -> u64 {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn requeued(&self) {
        self.requeued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            pages_visited: self.pages_visited.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
        }
    }
}

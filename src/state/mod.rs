//! State module for tracking crawl progress
//!
//! This module holds everything the workers share besides the frontier:
//!
//! - `PayloadSet`: the ordered, deduplicated flags found so far
//! - `VisitCounters`: progress counters for reporting
//! - `ExtractionState`: the synchronized wrapper that also owns the
//!   "still searching" flag and the list of pages whose markup failed

mod counters;
mod payloads;

// Re-export main types
pub use counters::{CounterSnapshot, VisitCounters};
pub use payloads::{PayloadOutcome, PayloadSet};

use crate::url::PageId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the data if another worker panicked while holding it
///
/// Every critical section in the crawler is a single collection operation,
/// so the protected data is never left half-updated.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared extraction state for one crawl
#[derive(Debug)]
pub struct ExtractionState {
    payloads: Mutex<PayloadSet>,
    searching: AtomicBool,
    feed_errors: Mutex<Vec<PageId>>,
    counters: VisitCounters,
}

impl ExtractionState {
    /// Creates state for a crawl that ends after `target` distinct payloads
    pub fn new(target: usize) -> Self {
        Self {
            payloads: Mutex::new(PayloadSet::new(target)),
            searching: AtomicBool::new(true),
            feed_errors: Mutex::new(Vec::new()),
            counters: VisitCounters::new(),
        }
    }

    /// Atomically checks for and appends a payload
    ///
    /// Reaching the target clears the searching flag before returning.
    pub fn record_payload(&self, payload: &str) -> PayloadOutcome {
        let outcome = lock(&self.payloads).insert(payload);
        if outcome == PayloadOutcome::TargetReached {
            self.stop();
        }
        outcome
    }

    /// True until the target is reached or the crawl is stopped
    pub fn is_searching(&self) -> bool {
        self.searching.load(Ordering::Acquire)
    }

    /// Clears the searching flag
    pub fn stop(&self) {
        self.searching.store(false, Ordering::Release);
    }

    pub fn target_reached(&self) -> bool {
        lock(&self.payloads).is_complete()
    }

    /// Payloads in discovery order
    pub fn payloads(&self) -> Vec<String> {
        lock(&self.payloads).as_slice().to_vec()
    }

    pub fn payload_count(&self) -> usize {
        lock(&self.payloads).len()
    }

    /// Remembers an identifier whose markup could not be scanned
    ///
    /// Each identifier is listed once, in the order it first failed, however
    /// many attempts fail. Returns true the first time.
    pub fn record_feed_error(&self, id: &PageId) -> bool {
        let mut errors = lock(&self.feed_errors);
        if errors.contains(id) {
            return false;
        }
        errors.push(id.clone());
        true
    }

    pub fn feed_errors(&self) -> Vec<PageId> {
        lock(&self.feed_errors).clone()
    }

    pub fn counters(&self) -> &VisitCounters {
        &self.counters
    }
}

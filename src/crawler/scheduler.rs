//! Frontier of identifiers awaiting a visit
//!
//! This module handles:
//! - FIFO queueing of page identifiers shared by all workers
//! - The seen-set guaranteeing each identifier is enqueued at most once
//! - Blocking dequeue with prompt wake-up on close
//! - Detecting exhaustion (empty queue and no identifier in flight)

use crate::state::lock;
use crate::url::PageId;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Why a requeue request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requeue {
    /// Back on the queue for another attempt
    Queued { attempt: u32 },

    /// The identifier failed too often and is dropped
    Abandoned { attempts: u32 },
}

#[derive(Debug, Default)]
struct FrontierInner {
    queue: VecDeque<PageId>,
    seen: HashSet<PageId>,
    failures: HashMap<PageId, u32>,
    in_flight: usize,
}

/// Deduplicated work queue shared by the worker pool
///
/// The seen-set check and the enqueue happen under one lock, so two workers
/// discovering the same link can never both enqueue it.
#[derive(Debug)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    notify: Notify,
    closed: AtomicBool,
    max_attempts: u32,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `max_attempts` - How many failures an identifier may have before a
    ///   requeue is refused (0 = never refused)
    pub fn new(max_attempts: u32) -> Self {
        Self {
            inner: Mutex::new(FrontierInner::default()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            max_attempts,
        }
    }

    /// Records an identifier as seen without queueing it
    ///
    /// Used for the start page, which is visited during seeding.
    pub fn mark_seen(&self, id: PageId) {
        lock(&self.inner).seen.insert(id);
    }

    /// Enqueues the identifier if it has never been seen
    ///
    /// # Returns
    ///
    /// * `true` - The identifier was new and is now queued
    /// * `false` - It was seen before (or the frontier is closed)
    pub fn push(&self, id: PageId) -> bool {
        if self.is_closed() {
            return false;
        }

        let added = {
            let mut inner = lock(&self.inner);
            if inner.seen.insert(id.clone()) {
                inner.queue.push_back(id);
                true
            } else {
                false
            }
        };

        if added {
            self.notify.notify_one();
        }
        added
    }

    /// Puts an identifier that failed mid-visit back on the queue
    ///
    /// Bypasses the seen-set, since the identifier is already in it.
    pub fn requeue(&self, id: PageId) -> Requeue {
        let outcome = {
            let mut inner = lock(&self.inner);
            let failures = inner.failures.entry(id.clone()).or_insert(0);
            *failures += 1;
            let attempts = *failures;

            if self.max_attempts > 0 && attempts >= self.max_attempts {
                Requeue::Abandoned { attempts }
            } else {
                inner.queue.push_back(id);
                Requeue::Queued { attempt: attempts + 1 }
            }
        };

        if matches!(outcome, Requeue::Queued { .. }) {
            self.notify.notify_one();
        }
        outcome
    }

    /// Takes the next identifier, waiting while the queue is empty
    ///
    /// Every `Some` must be paired with a later [`Frontier::complete`].
    ///
    /// # Returns
    ///
    /// * `Some(PageId)` - Work for the caller
    /// * `None` - The frontier was closed, or it is empty with nothing in
    ///   flight that could refill it
    pub async fn pop(&self) -> Option<PageId> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_closed() {
                return None;
            }

            {
                let mut inner = lock(&self.inner);
                if let Some(id) = inner.queue.pop_front() {
                    inner.in_flight += 1;
                    return Some(id);
                }
                if inner.in_flight == 0 {
                    drop(inner);
                    tracing::debug!("Frontier exhausted");
                    self.close();
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Marks a popped identifier as finished
    ///
    /// Closes the frontier if this was the last identifier in flight and
    /// nothing is queued.
    pub fn complete(&self) {
        let exhausted = {
            let mut inner = lock(&self.inner);
            inner.in_flight = inner.in_flight.saturating_sub(1);
            inner.in_flight == 0 && inner.queue.is_empty()
        };

        if exhausted {
            tracing::debug!("Frontier exhausted");
            self.close();
        }
    }

    /// Stops the frontier and wakes every waiting worker
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// True if the frontier closed because it ran dry rather than being stopped
    pub fn is_exhausted(&self) -> bool {
        let inner = lock(&self.inner);
        inner.queue.is_empty() && inner.in_flight == 0
    }

    /// Number of identifiers waiting in the queue
    pub fn len(&self) -> usize {
        lock(&self.inner).queue.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner).queue.is_empty()
    }

    /// Number of distinct identifiers ever seen
    pub fn seen_count(&self) -> usize {
        lock(&self.inner).seen.len()
    }

    pub fn has_seen(&self, id: &PageId) -> bool {
        lock(&self.inner).seen.contains(id)
    }
}

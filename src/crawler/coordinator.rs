//! Crawler coordinator - login, seeding, and the worker pool
//!
//! This module contains the crawl lifecycle:
//! - Logging in once before any worker starts
//! - Seeding the frontier from the start page
//! - Running a fixed pool of workers over the shared frontier
//! - Stopping on the first of: target reached, frontier exhausted, deadline
//! - Assembling the final report

use crate::config::Config;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{HtmlScanner, MarkupScanner, ScanError};
use crate::crawler::scheduler::{Frontier, Requeue};
use crate::crawler::session::Session;
use crate::http::markers::page_count;
use crate::http::Transport;
use crate::state::{lock, CounterSnapshot, ExtractionState, PayloadOutcome};
use crate::url::PageId;
use crate::{CrawlerError, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::{AbortHandle, JoinSet};

/// Why the crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Every flag was found
    TargetReached,

    /// Nothing left to visit and no visit in flight
    FrontierExhausted,

    /// The configured deadline passed first
    DeadlineExceeded,
}

impl std::fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            CrawlOutcome::TargetReached => "target reached",
            CrawlOutcome::FrontierExhausted => "frontier exhausted",
            CrawlOutcome::DeadlineExceeded => "deadline exceeded",
        };
        f.write_str(text)
    }
}

/// Everything known about a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub outcome: CrawlOutcome,

    /// Flags in discovery order
    pub payloads: Vec<String>,

    pub target: usize,
    pub counters: CounterSnapshot,

    /// Distinct identifiers ever enqueued (plus the start page)
    pub identifiers_seen: usize,

    /// Identifiers whose markup could not be scanned
    pub feed_errors: Vec<PageId>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Abort handles of the visit tasks currently running, keyed by worker
#[derive(Debug, Default)]
struct VisitTasks {
    running: Mutex<HashMap<usize, AbortHandle>>,
}

impl VisitTasks {
    /// Registers a worker's visit; aborts it straight away if the crawl
    /// already stopped, so a visit can never outlive `abort_all`
    fn track(&self, worker: usize, handle: AbortHandle, state: &ExtractionState) {
        lock(&self.running).insert(worker, handle.clone());
        if !state.is_searching() {
            handle.abort();
        }
    }

    fn finish(&self, worker: usize) {
        lock(&self.running).remove(&worker);
    }

    fn abort_all(&self) -> usize {
        let running = lock(&self.running);
        for handle in running.values() {
            handle.abort();
        }
        running.len()
    }
}

/// State every worker shares; cloning only bumps reference counts
#[derive(Clone)]
struct CrawlContext {
    fetcher: Fetcher,
    session: Arc<Session>,
    scanner: Arc<dyn MarkupScanner>,
    frontier: Arc<Frontier>,
    state: Arc<ExtractionState>,
    visits: Arc<VisitTasks>,
    started: Instant,
    progress_interval: u64,
}

impl CrawlContext {
    async fn fetch_page(&self, path: &str) -> Result<Option<String>> {
        self.state.counters().page_visited();
        self.fetcher.fetch(&self.session.get(path)).await
    }

    /// Scans one page body, enqueueing its links and recording its flags
    ///
    /// Links and flags are kept even when a flag heading is unreadable; the
    /// first such error is returned once they are recorded.
    fn feed(&self, id: &PageId, body: &str) -> Option<ScanError> {
        let output = self.scanner.scan(body);

        let mut added = 0;
        for link in output.links {
            if self.frontier.push(link) {
                added += 1;
            }
        }
        if added > 0 {
            tracing::trace!("{} new identifiers from {}", added, id);
        }

        for payload in output.payloads {
            match self.state.record_payload(&payload) {
                PayloadOutcome::Added => {
                    tracing::info!(
                        "Found flag {} on {} ({} so far)",
                        payload,
                        id,
                        self.state.payload_count()
                    );
                }
                PayloadOutcome::TargetReached => {
                    tracing::info!("Found flag {} on {}; all flags found", payload, id);
                    self.frontier.close();
                }
                PayloadOutcome::Duplicate => {
                    tracing::debug!("Flag {} seen again on {}", payload, id);
                }
                PayloadOutcome::Ignored => {}
            }
        }

        output.errors.into_iter().next()
    }

    /// Visits a user's home page and every friends page
    ///
    /// A scan error on one page does not cut the visit short; it is reported
    /// after the remaining pages have been fed.
    async fn visit(&self, id: &PageId) -> Result<()> {
        tracing::debug!("Visiting {}", id);
        let mut scan_error = None;

        if let Some(body) = self.fetch_page(id.as_str()).await? {
            scan_error = self.feed(id, &body);
        }

        if self.state.is_searching() {
            let first = self.fetch_page(&id.friends_page(1)).await?;
            let pages = first.as_deref().and_then(page_count).unwrap_or(1);
            if let Some(body) = first {
                scan_error = scan_error.or(self.feed(id, &body));
            }

            for page in 2..=pages {
                if !self.state.is_searching() {
                    break;
                }
                if let Some(body) = self.fetch_page(&id.friends_page(page)).await? {
                    scan_error = scan_error.or(self.feed(id, &body));
                }
            }
        }

        match scan_error {
            Some(source) => Err(CrawlerError::Scan {
                id: id.to_string(),
                source,
            }),
            None => Ok(()),
        }
    }

    /// Supervised worker loop
    ///
    /// Each visit runs in its own task so that neither an error nor a panic
    /// can lose the identifier; a failed identifier goes back on the
    /// frontier and the worker moves on.
    async fn run_worker(self, worker: usize) {
        tracing::debug!("Worker {} started", worker);

        while self.state.is_searching() {
            let Some(id) = self.frontier.pop().await else {
                break;
            };
            if !self.state.is_searching() {
                self.frontier.complete();
                break;
            }

            self.state.counters().dispatched();

            let visit = {
                let ctx = self.clone();
                let id = id.clone();
                tokio::spawn(async move { ctx.visit(&id).await })
            };
            self.visits.track(worker, visit.abort_handle(), &self.state);
            let joined = visit.await;
            self.visits.finish(worker);

            match joined {
                Ok(Ok(())) => {
                    let completed = self.state.counters().completed();
                    if completed % self.progress_interval == 0 {
                        self.log_progress(completed);
                    }
                }
                Ok(Err(e)) => self.recover(worker, id, &e),
                Err(e) if e.is_cancelled() => {
                    tracing::debug!("Worker {} visit of {} cancelled", worker, id);
                }
                Err(e) => self.recover(worker, id, &CrawlerError::Worker(e.to_string())),
            }

            self.frontier.complete();
        }

        tracing::debug!("Worker {} finished", worker);
    }

    fn recover(&self, worker: usize, id: PageId, reason: &CrawlerError) {
        if matches!(reason, CrawlerError::Scan { .. }) {
            self.state.record_feed_error(&id);
        }

        let label = id.to_string();
        match self.frontier.requeue(id) {
            Requeue::Queued { attempt } => {
                self.state.counters().requeued();
                tracing::warn!(
                    "Worker {} failed on {}: {}; requeued for attempt {}",
                    worker,
                    label,
                    reason,
                    attempt
                );
            }
            Requeue::Abandoned { attempts } => {
                tracing::warn!(
                    "Worker {} failed on {}: {}; abandoned after {} attempts",
                    worker,
                    label,
                    reason,
                    attempts
                );
            }
        }
    }

    fn log_progress(&self, completed: u64) {
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { completed as f64 / elapsed } else { 0.0 };
        let remaining = self.frontier.len();
        let eta = if rate > 0.0 { remaining as f64 / rate } else { 0.0 };
        let counters = self.state.counters().snapshot();

        tracing::info!(
            "Progress: {:.0}s elapsed, {} pages, {} users done, {} queued, {:.2} users/sec, ~{:.0}s remaining",
            elapsed,
            counters.pages_visited,
            completed,
            remaining,
            rate,
            eta
        );
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Fetcher,
    scanner: Arc<dyn MarkupScanner>,
}

impl Coordinator {
    /// Creates a coordinator sending every request through `transport`
    pub fn new(config: Config, transport: Arc<dyn Transport>) -> Self {
        let fetcher = Fetcher::from_config(transport, &config.crawler);
        let scanner = Arc::new(HtmlScanner::from_config(&config.scanner));
        Self {
            config: Arc::new(config),
            fetcher,
            scanner,
        }
    }

    /// Replaces the markup scanner
    pub fn with_scanner(mut self, scanner: Arc<dyn MarkupScanner>) -> Self {
        self.scanner = scanner;
        self
    }

    /// Runs a complete crawl
    ///
    /// # Phases
    ///
    /// 1. Log in (fatal on failure)
    /// 2. Fetch and scan the start page, single-threaded
    /// 3. Run the worker pool until the target is reached, the frontier is
    ///    exhausted, or the deadline passes
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl ended normally, whatever the outcome
    /// * `Err(CrawlerError)` - Login or seeding failed
    pub async fn run(&self, username: &str, password: &str) -> Result<CrawlReport> {
        let started_at = Utc::now();
        let started = Instant::now();
        let crawler = &self.config.crawler;

        let session = Session::login(
            &self.fetcher,
            &self.config.server.host,
            &crawler.login_path,
            username,
            password,
        )
        .await?;

        let ctx = CrawlContext {
            fetcher: self.fetcher.clone(),
            session: Arc::new(session),
            scanner: Arc::clone(&self.scanner),
            frontier: Arc::new(Frontier::new(crawler.max_page_attempts)),
            state: Arc::new(ExtractionState::new(crawler.target_flags)),
            visits: Arc::new(VisitTasks::default()),
            started,
            progress_interval: crawler.progress_interval.max(1),
        };

        self.seed(&ctx).await?;

        let timed_out = if ctx.state.is_searching() {
            self.run_pool(&ctx).await
        } else {
            false
        };

        let outcome = if ctx.state.target_reached() {
            CrawlOutcome::TargetReached
        } else if timed_out {
            CrawlOutcome::DeadlineExceeded
        } else {
            CrawlOutcome::FrontierExhausted
        };

        let report = CrawlReport {
            outcome,
            payloads: ctx.state.payloads(),
            target: crawler.target_flags,
            counters: ctx.state.counters().snapshot(),
            identifiers_seen: ctx.frontier.seen_count(),
            feed_errors: ctx.state.feed_errors(),
            started_at,
            finished_at: Utc::now(),
            elapsed: started.elapsed(),
        };

        tracing::info!(
            "Crawl finished ({}): {}/{} flags, {} pages in {:?}",
            report.outcome,
            report.payloads.len(),
            report.target,
            report.counters.pages_visited,
            report.elapsed
        );

        Ok(report)
    }

    /// Visits the start page and marks it seen so it is never enqueued
    async fn seed(&self, ctx: &CrawlContext) -> Result<()> {
        let start = PageId::new(&self.config.crawler.start_path);
        ctx.frontier.mark_seen(start.clone());

        match ctx.fetch_page(start.as_str()).await? {
            Some(body) => {
                if let Some(source) = ctx.feed(&start, &body) {
                    tracing::warn!("Start page {} could not be fully scanned: {}", start, source);
                    ctx.state.record_feed_error(&start);
                }
            }
            None => tracing::warn!("Start page {} was not available", start),
        }

        tracing::info!("Seeded frontier with {} identifiers from {}", ctx.frontier.len(), start);
        Ok(())
    }

    /// Runs the workers; returns true if the deadline cut them off
    async fn run_pool(&self, ctx: &CrawlContext) -> bool {
        let workers = self.config.crawler.workers;
        let mut pool = JoinSet::new();
        for worker in 0..workers {
            pool.spawn(ctx.clone().run_worker(worker));
        }
        tracing::info!("Started {} workers", workers);

        let deadline = self.config.crawler.deadline_secs.map(Duration::from_secs);
        let timed_out = match deadline {
            Some(limit) => {
                let remaining = limit.saturating_sub(ctx.started.elapsed());
                tokio::time::timeout(remaining, drain(&mut pool)).await.is_err()
            }
            None => {
                drain(&mut pool).await;
                false
            }
        };

        if timed_out {
            tracing::warn!("Deadline reached; stopping workers");
            ctx.state.stop();
            ctx.frontier.close();
            let aborted = ctx.visits.abort_all();
            tracing::debug!("Aborted {} visits in flight", aborted);
            // Each worker awaits its aborted visit, so once the pool drains
            // no visit task is left running.
            drain(&mut pool).await;
        }

        timed_out
    }
}

async fn drain(pool: &mut JoinSet<()>) {
    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            if e.is_panic() {
                tracing::error!("Worker task panicked: {}", e);
            }
        }
    }
}

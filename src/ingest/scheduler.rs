use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Interval, MissedTickBehavior};

use super::ingestor::Ingestor;
use super::shutdown::Shutdown;
use crate::storage::{EntryStore, StoreError};

/// Source of scheduler ticks.
///
/// `tick` resolves when the next cycle should run and returns `false` once
/// no more ticks will ever arrive, which ends [`Scheduler::run`].
#[async_trait]
pub trait Ticker: Send {
    async fn tick(&mut self) -> bool;
}

/// Wall-clock ticker over `tokio::time::interval`.
///
/// The first tick fires immediately. Ticks missed while a slow cycle was
/// running are dropped rather than replayed back to back.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Manual ticks: every `()` sent is one cycle; dropping the sender ends the loop.
#[async_trait]
impl Ticker for mpsc::Receiver<()> {
    async fn tick(&mut self) -> bool {
        self.recv().await.is_some()
    }
}

/// Outcome of one scheduler cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub selected: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Periodically picks the least recently fetched feeds and ingests them in
/// parallel, at most `concurrency` at a time.
///
/// Every cycle is a barrier: all ingestors spawned by one tick finish before
/// the next tick selects feeds, so a feed is never ingested twice at once.
pub struct Scheduler {
    ingestor: Arc<Ingestor>,
    store: Arc<dyn EntryStore>,
    concurrency: usize,
}

impl Scheduler {
    /// A `concurrency` of zero is raised to one.
    pub fn new(ingestor: Arc<Ingestor>, store: Arc<dyn EntryStore>, concurrency: usize) -> Self {
        Self {
            ingestor,
            store,
            concurrency: concurrency.max(1),
        }
    }

    /// Run cycles until shutdown is signalled or the ticker is exhausted.
    ///
    /// A failed feed selection is logged and the loop waits for the next
    /// tick. On shutdown the in-flight cycle sees the signal, finishes, and
    /// then this returns.
    pub async fn run<T: Ticker>(&self, mut ticker: T, shutdown: Shutdown) {
        tracing::info!(concurrency = self.concurrency, "Collecting feeds");
        let mut stop = shutdown.clone();

        loop {
            let ticked = tokio::select! {
                biased;
                _ = stop.triggered() => false,
                more = ticker.tick() => more,
            };
            if !ticked {
                break;
            }

            match self.run_tick(&shutdown).await {
                Ok(report) if report.selected > 0 => {
                    tracing::info!(
                        selected = report.selected,
                        succeeded = report.succeeded,
                        failed = report.failed,
                        "Finished collecting feeds"
                    );
                }
                Ok(_) => tracing::debug!("No feeds to collect"),
                Err(e) => tracing::error!(error = %e, "Couldn't get next feeds to fetch"),
            }

            if shutdown.is_triggered() {
                break;
            }
        }

        tracing::info!("Scheduler stopped");
    }

    /// Select up to `concurrency` due feeds, ingest them concurrently and wait
    /// for every one to finish.
    ///
    /// Only the selection itself can fail; per-feed failures (including a
    /// panicking task) are logged and counted in the report.
    pub async fn run_tick(&self, shutdown: &Shutdown) -> Result<TickReport, StoreError> {
        let feeds = self.store.select_due_feeds(self.concurrency).await?;
        let mut report = TickReport {
            selected: feeds.len(),
            ..TickReport::default()
        };
        tracing::debug!(count = feeds.len(), "Found feeds to fetch");

        let mut tasks = JoinSet::new();
        for feed in feeds {
            let ingestor = Arc::clone(&self.ingestor);
            let shutdown = shutdown.clone();
            tasks.spawn(async move { ingestor.ingest(&feed, &shutdown).await.is_ok() });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => report.succeeded += 1,
                Ok(false) => report.failed += 1,
                Err(e) => {
                    tracing::error!(error = %e, "Feed ingestion task panicked");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

//! Active-poll scheduler.
//!
//! The host never pushes byte counts, so every `active-running` record gets
//! a poll chain: sleep, re-fetch that one record, feed the result back into
//! the engine, repeat while the record is still running. Each chain owns the
//! record's throughput estimator as plain data.
//!
//! # Invariants
//!
//! - At most one chain, and at most one outstanding fetch, per record
//! - A chain only re-arms from its own completed fetch
//! - Leaving `active-running` zeroes the rate immediately

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use dlshelf_core::{
    DownloadId, DownloadRecord, HostDownloadService, ListFilter, PresentationState,
    ThroughputEstimator,
};

use crate::engine::TaskResult;

#[derive(Debug)]
struct PollChain {
    estimator: ThroughputEstimator,
    /// Record is currently `active-running`.
    active: bool,
    /// A fetch is outstanding.
    in_flight: bool,
}

/// Per-record poll chains keyed by download id.
#[derive(Debug)]
pub struct PollScheduler {
    interval: Duration,
    window_cap: Duration,
    chains: HashMap<DownloadId, PollChain>,
}

impl PollScheduler {
    /// Create a scheduler polling every `interval`.
    #[must_use]
    pub fn new(interval: Duration, window_cap: Duration) -> Self {
        Self {
            interval,
            window_cap,
            chains: HashMap::new(),
        }
    }

    /// Reconcile the chain for a freshly merged record.
    ///
    /// Feeds the estimator, starts or stops the chain on state transitions,
    /// and returns `true` when the caller should issue a fetch now.
    pub fn sync(&mut self, record: &DownloadRecord, now: Instant) -> bool {
        let running = PresentationState::underlying(record) == PresentationState::ActiveRunning
            && record.is_materialized();

        if !running {
            if let Some(chain) = self.chains.get_mut(&record.id) {
                if chain.active {
                    tracing::debug!(target: "dlshelf.poll", id = %record.id, "Poll chain stopped");
                }
                chain.active = false;
                chain.estimator.reset();
                if !chain.in_flight {
                    self.chains.remove(&record.id);
                }
            }
            return false;
        }

        let cap = self.window_cap;
        let chain = self.chains.entry(record.id).or_insert_with(|| {
            tracing::debug!(target: "dlshelf.poll", id = %record.id, "Poll chain started");
            PollChain {
                estimator: ThroughputEstimator::new(cap),
                active: true,
                in_flight: false,
            }
        });
        chain.active = true;
        chain.estimator.observe(now, record.bytes_received);

        if chain.in_flight {
            return false;
        }
        chain.in_flight = true;
        true
    }

    /// Mark the outstanding fetch for `id` as finished.
    ///
    /// A chain whose record stopped running while the fetch was out is
    /// dropped here.
    pub fn complete(&mut self, id: DownloadId) {
        if let Some(chain) = self.chains.get_mut(&id) {
            chain.in_flight = false;
            if !chain.active {
                self.chains.remove(&id);
            }
        }
    }

    /// Drop the chain for a removed or vanished record.
    pub fn forget(&mut self, id: DownloadId) {
        if self.chains.remove(&id).is_some() {
            tracing::debug!(target: "dlshelf.poll", %id, "Poll chain forgotten");
        }
    }

    /// Smoothed rate in bytes per second; zero unless actively running.
    #[must_use]
    pub fn rate(&self, id: DownloadId) -> f64 {
        self.chains
            .get(&id)
            .filter(|chain| chain.active)
            .map_or(0.0, |chain| chain.estimator.rate())
    }

    /// Whether a chain exists and is active for `id`.
    #[must_use]
    pub fn is_polling(&self, id: DownloadId) -> bool {
        self.chains.get(&id).is_some_and(|chain| chain.active)
    }

    /// Number of active chains.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.chains.values().filter(|chain| chain.active).count()
    }

    /// Spawn the delayed single-record fetch for `id`.
    ///
    /// `issued` is the engine's host event sequence at spawn time and comes
    /// back with the result.
    pub(crate) fn spawn_fetch(
        &self,
        id: DownloadId,
        issued: u64,
        host: &Arc<dyn HostDownloadService>,
        results: &mpsc::UnboundedSender<TaskResult>,
    ) {
        let host = Arc::clone(host);
        let results = results.clone();
        let interval = self.interval;
        tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let result = host.list(&ListFilter::by_id(id)).await;
            // Engine gone means nobody is waiting for this poll.
            let _ = results.send(TaskResult::Polled { id, issued, result });
        });
    }
}

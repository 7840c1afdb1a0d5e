//! Debounced aggregation engine.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use buildtrack_shared::config::AnalyticsConfig;

use super::filter::AnalyticsFilter;
use super::series::compute_report;
use super::snapshot::{SnapshotCache, SnapshotProvider};
use super::types::AnalyticsReport;

/// Commands accepted by the engine worker.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Replace the active filter and recompute.
    SetFilter(AnalyticsFilter),
    /// Underlying data changed: drop cached snapshots and recompute.
    Invalidate,
}

/// Handle to the background aggregation worker.
///
/// Commands are debounced: a burst of filter changes inside the debounce
/// window collapses into a single snapshot load and recompute, and a
/// result that was superseded while computing is discarded unpublished.
/// Reports are published through a `watch` channel, so consumers always
/// observe whole reports, never partial updates.
pub struct AnalyticsEngine {
    commands: mpsc::UnboundedSender<EngineCommand>,
    reports: watch::Receiver<Option<Arc<AnalyticsReport>>>,
}

impl AnalyticsEngine {
    /// Spawns the worker with the wall-clock date.
    #[must_use]
    pub fn spawn(
        provider: Arc<dyn SnapshotProvider>,
        config: &AnalyticsConfig,
        filter: AnalyticsFilter,
    ) -> Self {
        Self::spawn_with_clock(provider, config, filter, || Utc::now().date_naive())
    }

    /// Spawns the worker with an injected clock, for deterministic tests.
    #[must_use]
    pub fn spawn_with_clock(
        provider: Arc<dyn SnapshotProvider>,
        config: &AnalyticsConfig,
        filter: AnalyticsFilter,
        today: fn() -> NaiveDate,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (report_tx, report_rx) = watch::channel(None);
        let cache = SnapshotCache::new(config);
        let debounce = Duration::from_millis(config.debounce_ms);
        tokio::spawn(run(
            command_rx, provider, cache, report_tx, debounce, filter, today,
        ));
        Self {
            commands: command_tx,
            reports: report_rx,
        }
    }

    /// Queues a filter change.
    pub fn set_filter(&self, filter: AnalyticsFilter) {
        self.send(EngineCommand::SetFilter(filter));
    }

    /// Queues a data invalidation, typically after a write.
    pub fn invalidate(&self) {
        self.send(EngineCommand::Invalidate);
    }

    fn send(&self, command: EngineCommand) {
        if self.commands.send(command).is_err() {
            warn!("analytics worker is gone; command dropped");
        }
    }

    /// Subscribes to published reports. The channel starts at `None` until
    /// the first computation lands.
    #[must_use]
    pub fn reports(&self) -> watch::Receiver<Option<Arc<AnalyticsReport>>> {
        self.reports.clone()
    }

    /// The most recently published report, if any.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<AnalyticsReport>> {
        self.reports.borrow().clone()
    }
}

async fn run(
    mut commands: mpsc::UnboundedReceiver<EngineCommand>,
    provider: Arc<dyn SnapshotProvider>,
    cache: SnapshotCache,
    reports: watch::Sender<Option<Arc<AnalyticsReport>>>,
    debounce: Duration,
    mut filter: AnalyticsFilter,
    today: fn() -> NaiveDate,
) {
    let mut carried: Option<EngineCommand> = None;
    loop {
        let first = match carried.take() {
            Some(command) => command,
            None => match commands.recv().await {
                Some(command) => command,
                None => return,
            },
        };
        apply_command(&mut filter, &cache, first);

        // Absorb the burst; every further command restarts the window.
        loop {
            match tokio::time::timeout(debounce, commands.recv()).await {
                Ok(Some(command)) => apply_command(&mut filter, &cache, command),
                Ok(None) | Err(_) => break,
            }
        }

        let snapshot = match cache.get_or_load(provider.as_ref(), filter.date_range).await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(error = %error, "analytics snapshot load failed; keeping last report");
                continue;
            }
        };
        let report = compute_report(&snapshot, &filter, today());

        // A command that arrived while computing supersedes this result.
        match commands.try_recv() {
            Ok(command) => {
                debug!("analytics result superseded before publication; discarding");
                carried = Some(command);
            }
            Err(TryRecvError::Empty) => {
                reports.send_replace(Some(Arc::new(report)));
            }
            Err(TryRecvError::Disconnected) => {
                reports.send_replace(Some(Arc::new(report)));
                return;
            }
        }
    }
}

fn apply_command(filter: &mut AnalyticsFilter, cache: &SnapshotCache, command: EngineCommand) {
    match command {
        EngineCommand::SetFilter(next) => {
            // A range change naturally misses the cache (snapshots are
            // keyed by range); other dimensions reuse the cached snapshot.
            if filter.is_pure_date_range_change(&next) {
                debug!("date range changed; snapshot reloads under the new key");
            }
            *filter = next;
        }
        EngineCommand::Invalidate => cache.invalidate_all(),
    }
}

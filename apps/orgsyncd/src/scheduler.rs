//! Cron scheduling with an overlap guard.
//!
//! The scheduler sleeps until the next cron occurrence and then starts a
//! cycle in a background task. A tick that fires while a cycle is still
//! running is skipped, not queued. Shutdown waits a bounded time for the
//! in-flight cycle before giving up.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use croner::errors::CronError;
use croner::Cron;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use orgsync_engine::{CycleReport, SyncResult};

/// One reconciliation cycle. The scheduler needs nothing else from the
/// application, and tests substitute their own runner.
#[async_trait]
pub trait CycleRunner: Send + Sync + 'static {
    async fn run_cycle(&self) -> SyncResult<CycleReport>;
}

pub struct Scheduler<R> {
    cron: Cron,
    runner: Arc<R>,
    running: Arc<Mutex<()>>,
    shutdown_timeout: Duration,
}

impl<R: CycleRunner> Scheduler<R> {
    /// Build a scheduler; fails when the cron expression does not parse.
    pub fn new(
        cron_expr: &str,
        runner: Arc<R>,
        shutdown_timeout: Duration,
    ) -> Result<Self, CronError> {
        let cron = Cron::new(cron_expr).parse()?;

        Ok(Self {
            cron,
            runner,
            running: Arc::new(Mutex::new(())),
            shutdown_timeout,
        })
    }

    /// Run until the shutdown signal flips, then drain.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("Scheduler started");

        loop {
            let now = Utc::now();
            let next = match self.cron.find_next_occurrence(&now, false) {
                Ok(next) => next,
                Err(e) => {
                    error!(error = %e, "No next cron occurrence, stopping scheduler");
                    break;
                }
            };
            let delay = (next - now).to_std().unwrap_or_default();
            debug!(next = %next, "Waiting for next scheduled cycle");

            tokio::select! {
                () = tokio::time::sleep(delay) => {
                    self.tick();
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Scheduler shutting down");
                        break;
                    }
                }
            }
        }

        self.drain().await;
    }

    /// Start a cycle unless one is already in flight.
    fn tick(&self) {
        let Ok(guard) = self.running.clone().try_lock_owned() else {
            warn!("Previous cycle still running, skipping this tick");
            return;
        };

        let runner = self.runner.clone();
        tokio::spawn(async move {
            let _running = guard;
            match runner.run_cycle().await {
                Ok(report) => {
                    debug!(mutated = report.mutated(), "Cycle finished");
                }
                Err(e) => {
                    error!(error = %e, "Reconciliation cycle failed");
                }
            }
        });
    }

    /// Wait for the in-flight cycle, bounded by the shutdown timeout.
    async fn drain(&self) {
        if tokio::time::timeout(self.shutdown_timeout, self.running.lock())
            .await
            .is_err()
        {
            warn!(
                timeout_secs = self.shutdown_timeout.as_secs(),
                "Shutdown drain timed out with a cycle still running"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    /// Runner that blocks inside `run_cycle` until released, counting how
    /// many cycles started and finished.
    struct BlockedRunner {
        started: Notify,
        release: Notify,
        starts: AtomicUsize,
        finished: AtomicUsize,
    }

    impl BlockedRunner {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                started: Notify::new(),
                release: Notify::new(),
                starts: AtomicUsize::new(0),
                finished: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CycleRunner for BlockedRunner {
        async fn run_cycle(&self) -> SyncResult<CycleReport> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            self.release.notified().await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(CycleReport::default())
        }
    }

    fn scheduler(
        runner: Arc<BlockedRunner>,
        shutdown_timeout: Duration,
    ) -> Scheduler<BlockedRunner> {
        Scheduler::new("* * * * *", runner, shutdown_timeout).unwrap()
    }

    #[test]
    fn test_invalid_cron_expression_is_rejected() {
        let runner = BlockedRunner::new();
        assert!(Scheduler::new("not a cron", runner, Duration::from_secs(1)).is_err());
    }

    #[tokio::test]
    async fn test_tick_is_skipped_while_a_cycle_is_running() {
        let runner = BlockedRunner::new();
        let scheduler = scheduler(runner.clone(), Duration::from_secs(5));

        scheduler.tick();
        runner.started.notified().await;

        // The guard is held by the first cycle; this tick must neither run
        // nor queue a second one.
        scheduler.tick();
        tokio::task::yield_now().await;
        assert_eq!(runner.starts.load(Ordering::SeqCst), 1);

        runner.release.notify_one();
        scheduler.drain().await;

        assert_eq!(runner.starts.load(Ordering::SeqCst), 1);
        assert_eq!(runner.finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_gives_up_after_the_shutdown_timeout() {
        let runner = BlockedRunner::new();
        let scheduler = scheduler(runner.clone(), Duration::from_millis(50));

        scheduler.tick();
        runner.started.notified().await;

        // The cycle is never released; drain must still return once the
        // shutdown timeout elapses.
        scheduler.drain().await;
        assert_eq!(runner.finished.load(Ordering::SeqCst), 0);
    }
}

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use deck_logging::{deck_debug, deck_info};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::{PollSettings, RefreshOutcome, Refresher};

/// Periodic refresh of the store, independent of user actions.
///
/// The first tick of each timer fires immediately. Every tick spawns its fetch
/// so the timer keeps running; a tick that finds the previous fetch for the
/// same resource still outstanding is skipped by the refresher. Failures are
/// never retried early, the next tick simply tries again.
pub struct Poller;

impl Poller {
    /// Starts both timers. Polling stops when the returned handle is dropped
    /// or stopped.
    pub fn spawn(refresher: Arc<Refresher>, settings: PollSettings) -> PollerHandle {
        deck_info!(
            "Polling listing every {:?}, stats every {:?}",
            settings.jobs_interval,
            settings.stats_interval
        );
        let jobs = tokio::spawn(run_timer(
            refresher.clone(),
            settings.jobs_interval,
            "listing",
            |refresher| async move { refresher.poll_jobs().await },
        ));
        let stats = tokio::spawn(run_timer(
            refresher.clone(),
            settings.stats_interval,
            "stats",
            |refresher| async move { refresher.poll_stats().await },
        ));
        PollerHandle {
            refresher,
            timers: vec![jobs, stats],
        }
    }
}

/// Scoped ownership of the poll timers. Dropping it tears the view down:
/// timers stop and fetches still in flight are abandoned.
pub struct PollerHandle {
    refresher: Arc<Refresher>,
    timers: Vec<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        self.refresher.is_alive()
    }

    pub fn stop(self) {
        // Drop does the work.
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.refresher.shut_down();
        for timer in &self.timers {
            timer.abort();
        }
        deck_info!("Polling stopped");
    }
}

async fn run_timer<F, Fut>(
    refresher: Arc<Refresher>,
    period: Duration,
    resource: &'static str,
    poll: F,
) where
    F: Fn(Arc<Refresher>) -> Fut + Send + 'static,
    Fut: Future<Output = RefreshOutcome> + Send + 'static,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let liveness = refresher.liveness().clone();

    loop {
        tokio::select! {
            _ = liveness.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let fetch = poll(refresher.clone());
        let liveness = liveness.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = liveness.cancelled() => {
                    deck_debug!("Abandoning {} fetch on teardown", resource);
                }
                outcome = fetch => {
                    deck_debug!("{} poll: {:?}", resource, outcome);
                }
            }
        });
    }
}

//! Fetch-and-apply path shared by the poller and the coordinator.
//!
//! Each polled resource (the full listing, the stats) has at most one fetch
//! in flight. Results are applied to the store only while the owning view is
//! alive; after [`Refresher::shut_down`] they are discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crawldeck_core::ResultStore;
use deck_logging::{deck_debug, deck_warn};
use tokio_util::sync::CancellationToken;

use crate::{list_all_jobs, RemoteClient, RemoteError};

pub type SharedStore = Arc<Mutex<ResultStore>>;

/// Locks the store, recovering from a poisoned lock; the store is always left consistent.
pub fn lock_store(store: &SharedStore) -> MutexGuard<'_, ResultStore> {
    store.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A fetch for the resource was already in flight; nothing was sent.
    Skipped,
    /// A fetch was in flight; it will be followed by one more fetch.
    Coalesced,
    /// The fetch completed after teardown and its result was dropped.
    Discarded,
    Failed(RemoteError),
}

/// Single-flight marker for one polled resource.
///
/// A requester raises `again` and then tries `busy`; the holder clears `busy`
/// and then reads `again`. Every access is `SeqCst` so at least one side
/// observes the other and the requested fetch is never lost.
#[derive(Debug, Default)]
struct InFlight {
    busy: AtomicBool,
    again: AtomicBool,
}

impl InFlight {
    fn try_acquire(&self) -> Option<InFlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlightGuard { flight: self })
    }
}

struct InFlightGuard<'a> {
    flight: &'a InFlight,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flight.busy.store(false, Ordering::SeqCst);
    }
}

pub struct Refresher {
    client: Arc<dyn RemoteClient>,
    store: SharedStore,
    page_limit: u32,
    alive: CancellationToken,
    jobs: InFlight,
    stats: InFlight,
}

impl Refresher {
    pub fn new(client: Arc<dyn RemoteClient>, store: SharedStore, page_limit: u32) -> Self {
        Self {
            client,
            store,
            page_limit,
            alive: CancellationToken::new(),
            jobs: InFlight::default(),
            stats: InFlight::default(),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Token cancelled when the owning view is torn down.
    pub fn liveness(&self) -> &CancellationToken {
        &self.alive
    }

    pub fn is_alive(&self) -> bool {
        !self.alive.is_cancelled()
    }

    /// Tears down: no later fetch result reaches the store.
    pub fn shut_down(&self) {
        self.alive.cancel();
    }

    /// A poll tick for the listing: skipped while another fetch is in flight.
    pub async fn poll_jobs(&self) -> RefreshOutcome {
        let outcome = match self.jobs.try_acquire() {
            Some(_guard) => self.fetch_jobs().await,
            None => {
                deck_debug!("Listing fetch still in flight; skipping tick");
                return RefreshOutcome::Skipped;
            }
        };
        // A command asked for a refresh while this tick was fetching.
        if self.jobs.again.load(Ordering::SeqCst) && outcome != RefreshOutcome::Discarded {
            return self.refresh_jobs().await;
        }
        outcome
    }

    /// A refresh after a command. If a fetch is already in flight, its holder
    /// runs one more fetch once it finishes, so the store ends up reflecting
    /// the command either way.
    pub async fn refresh_jobs(&self) -> RefreshOutcome {
        self.jobs.again.store(true, Ordering::SeqCst);
        let mut outcome = RefreshOutcome::Coalesced;
        while self.jobs.again.load(Ordering::SeqCst) {
            let Some(_guard) = self.jobs.try_acquire() else {
                return outcome;
            };
            if !self.jobs.again.swap(false, Ordering::SeqCst) {
                return outcome;
            }
            outcome = self.fetch_jobs().await;
            if outcome == RefreshOutcome::Discarded {
                return outcome;
            }
        }
        outcome
    }

    /// A poll tick for the aggregate statistics.
    pub async fn poll_stats(&self) -> RefreshOutcome {
        let Some(_guard) = self.stats.try_acquire() else {
            deck_debug!("Stats fetch still in flight; skipping tick");
            return RefreshOutcome::Skipped;
        };
        let result = self.client.stats().await;
        if !self.is_alive() {
            return RefreshOutcome::Discarded;
        }
        match result {
            Ok(stats) => {
                lock_store(&self.store).set_stats(stats);
                RefreshOutcome::Applied
            }
            Err(err) => {
                deck_warn!("Stats refresh failed: {}", err);
                RefreshOutcome::Failed(err)
            }
        }
    }

    async fn fetch_jobs(&self) -> RefreshOutcome {
        let result = list_all_jobs(self.client.as_ref(), self.page_limit).await;
        if !self.is_alive() {
            deck_debug!("Dropping listing fetched after teardown");
            return RefreshOutcome::Discarded;
        }
        match result {
            Ok(jobs) => {
                lock_store(&self.store).replace_all(jobs);
                RefreshOutcome::Applied
            }
            Err(err) => {
                deck_warn!("Listing refresh failed: {}", err);
                lock_store(&self.store).record_refresh_failure(err.to_string());
                RefreshOutcome::Failed(err)
            }
        }
    }
}

//! The single in-memory cache of known crawl jobs.
//!
//! Contents change only through [`ResultStore::replace_all`], which swaps in a
//! whole snapshot and notifies every subscriber exactly once, identical
//! snapshot or not.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use deck_logging::{deck_debug, deck_warn};

use crate::model::{CrawlJob, JobId, JobStats};

/// Notification delivered to store subscribers.
#[derive(Debug, Clone, Copy)]
pub enum StoreEvent<'a> {
    /// The job cache was replaced with `jobs`.
    Replaced { revision: u64, jobs: &'a [CrawlJob] },
    /// The service reported new aggregate statistics.
    StatsUpdated(JobStats),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent<'_>) + Send>;

/// How fresh the cache is. Poll failures land here instead of reaching the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Freshness {
    pub last_refreshed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
}

impl Freshness {
    /// True when the most recent refresh attempt failed.
    pub fn is_stale(&self) -> bool {
        self.consecutive_failures > 0
    }
}

#[derive(Default)]
pub struct ResultStore {
    jobs: Vec<CrawlJob>,
    index: HashMap<JobId, usize>,
    stats: Option<JobStats>,
    revision: u64,
    freshness: Freshness,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for ResultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStore")
            .field("jobs", &self.jobs.len())
            .field("revision", &self.revision)
            .field("freshness", &self.freshness)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole cache with `jobs`, then notifies subscribers.
    ///
    /// Records are normalized on the way in. If the service ever repeats an
    /// id, the later record wins and keeps the position of the first.
    pub fn replace_all(&mut self, jobs: Vec<CrawlJob>) {
        let mut next: Vec<CrawlJob> = Vec::with_capacity(jobs.len());
        let mut index = HashMap::with_capacity(jobs.len());
        for job in jobs {
            let job = job.normalized();
            match index.get(&job.id) {
                Some(&slot) => {
                    deck_warn!("Duplicate job id {} in snapshot; keeping the later record", job.id);
                    next[slot] = job;
                }
                None => {
                    index.insert(job.id.clone(), next.len());
                    next.push(job);
                }
            }
        }

        self.jobs = next;
        self.index = index;
        self.revision += 1;
        self.freshness = Freshness {
            last_refreshed_at: Some(Utc::now()),
            last_error: None,
            consecutive_failures: 0,
        };
        deck_debug!(
            "Store replaced: revision={} jobs={}",
            self.revision,
            self.jobs.len()
        );

        let event = StoreEvent::Replaced {
            revision: self.revision,
            jobs: &self.jobs,
        };
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    pub fn set_stats(&mut self, stats: JobStats) {
        self.stats = Some(stats);
        let event = StoreEvent::StatsUpdated(stats);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    /// Records a failed refresh; the cached contents stay as they were.
    pub fn record_refresh_failure(&mut self, reason: impl Into<String>) {
        self.freshness.last_error = Some(reason.into());
        self.freshness.consecutive_failures += 1;
    }

    /// Current cache contents, in the order of the last snapshot.
    pub fn snapshot(&self) -> Vec<CrawlJob> {
        self.jobs.clone()
    }

    pub fn jobs(&self) -> &[CrawlJob] {
        &self.jobs
    }

    pub fn get(&self, id: &JobId) -> Option<&CrawlJob> {
        self.index.get(id).map(|&slot| &self.jobs[slot])
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.index.contains_key(id)
    }

    pub fn ids(&self) -> BTreeSet<JobId> {
        self.index.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Number of completed `replace_all` calls.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn stats(&self) -> Option<JobStats> {
        self.stats
    }

    pub fn freshness(&self) -> &Freshness {
        &self.freshness
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent<'_>) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }
}

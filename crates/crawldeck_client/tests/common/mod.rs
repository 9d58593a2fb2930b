#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crawldeck_client::{
    FailureKind, JobPage, ListParams, MessageResponse, RemoteClient, RemoteError, SharedStore,
};
use crawldeck_core::{CrawlJob, CrawlStatus, JobId, JobStats, ResultStore};
use tokio::sync::Notify;

pub fn init_logging() {
    deck_logging::initialize_for_tests();
}

pub fn at() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn job(id: &str, status: CrawlStatus) -> CrawlJob {
    let mut job = CrawlJob::queued(id, format!("https://{id}.example.com"), at());
    job.status = status;
    job
}

pub fn shared_store() -> SharedStore {
    Arc::new(Mutex::new(ResultStore::new()))
}

pub fn ids(raw: &[&str]) -> Vec<JobId> {
    raw.iter().map(|id| JobId::from(*id)).collect()
}

fn failure(kind: FailureKind, message: &str) -> RemoteError {
    RemoteError {
        kind,
        message: message.to_string(),
    }
}

/// In-memory crawl service. Behaves like the real one for the calls the
/// client makes and records every call it receives.
#[derive(Default)]
pub struct FakeRemote {
    jobs: Mutex<Vec<CrawlJob>>,
    failing: Mutex<HashSet<JobId>>,
    calls: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
    stats_calls: AtomicUsize,
    list_delay: Mutex<Option<Duration>>,
    gate_stop: Mutex<bool>,
    pub stop_entered: Notify,
    stop_release: Notify,
    next_id: AtomicUsize,
}

impl FakeRemote {
    pub fn with_jobs(jobs: Vec<CrawlJob>) -> Arc<Self> {
        let fake = Self::default();
        *fake.jobs.lock().unwrap() = jobs;
        fake.next_id.store(100, Ordering::SeqCst);
        Arc::new(fake)
    }

    pub fn fail_for(&self, id: &str) {
        self.failing.lock().unwrap().insert(JobId::from(id));
    }

    pub fn delay_listing(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = Some(delay);
    }

    /// Makes every stop call wait for [`FakeRemote::release_stop`].
    pub fn gate_stops(&self) {
        *self.gate_stop.lock().unwrap() = true;
    }

    pub fn release_stop(&self) {
        self.stop_release.notify_one();
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn status_of(&self, id: &str) -> Option<CrawlStatus> {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|job| job.id.as_str() == id)
            .map(|job| job.status)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn mutate(
        &self,
        verb: &str,
        id: &JobId,
        apply: impl FnOnce(&mut Vec<CrawlJob>, usize),
    ) -> Result<MessageResponse, RemoteError> {
        self.record(format!("{verb}:{id}"));
        if self.failing.lock().unwrap().contains(id) {
            return Err(failure(FailureKind::HttpStatus(500), "internal error"));
        }
        let mut jobs = self.jobs.lock().unwrap();
        let Some(index) = jobs.iter().position(|job| &job.id == id) else {
            return Err(failure(FailureKind::NotFound, "URL not found"));
        };
        apply(&mut jobs, index);
        Ok(MessageResponse {
            message: format!("{verb} ok"),
        })
    }
}

#[async_trait]
impl RemoteClient for FakeRemote {
    async fn submit_url(&self, url: &str) -> Result<CrawlJob, RemoteError> {
        self.record(format!("submit:{url}"));
        if url.contains("reject") {
            return Err(failure(FailureKind::HttpStatus(400), "Invalid URL format"));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let job = CrawlJob::queued(id.as_str(), url, at());
        self.jobs.lock().unwrap().push(job.clone());
        Ok(job)
    }

    async fn list_jobs(&self, params: &ListParams) -> Result<JobPage, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let data = self.jobs.lock().unwrap().clone();
        Ok(JobPage {
            total: data.len() as u64,
            data,
            page: params.page.unwrap_or(1),
            limit: params.limit.unwrap_or(10),
            total_pages: 1,
        })
    }

    async fn get_job(&self, id: &JobId) -> Result<CrawlJob, RemoteError> {
        self.record(format!("get:{id}"));
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|job| &job.id == id)
            .cloned()
            .ok_or_else(|| failure(FailureKind::NotFound, "URL not found"))
    }

    async fn start(&self, id: &JobId) -> Result<MessageResponse, RemoteError> {
        self.mutate("start", id, |jobs, index| {
            jobs[index].status = CrawlStatus::Running;
        })
    }

    async fn stop(&self, id: &JobId) -> Result<MessageResponse, RemoteError> {
        let gated = *self.gate_stop.lock().unwrap();
        if gated {
            self.stop_entered.notify_one();
            self.stop_release.notified().await;
        }
        self.mutate("stop", id, |jobs, index| {
            jobs[index].status = CrawlStatus::Queued;
        })
    }

    async fn delete(&self, id: &JobId) -> Result<MessageResponse, RemoteError> {
        self.mutate("delete", id, |jobs, index| {
            jobs.remove(index);
        })
    }

    async fn bulk_start(&self, ids: &[JobId]) -> Result<MessageResponse, RemoteError> {
        let joined = ids.iter().map(JobId::as_str).collect::<Vec<_>>().join(",");
        self.record(format!("bulk_start:{joined}"));
        let mut jobs = self.jobs.lock().unwrap();
        for job in jobs.iter_mut().filter(|job| ids.contains(&job.id)) {
            job.status = CrawlStatus::Running;
        }
        Ok(MessageResponse {
            message: format!("Started {} URLs", ids.len()),
        })
    }

    async fn bulk_delete(&self, ids: &[JobId]) -> Result<MessageResponse, RemoteError> {
        let joined = ids.iter().map(JobId::as_str).collect::<Vec<_>>().join(",");
        self.record(format!("bulk_delete:{joined}"));
        self.jobs
            .lock()
            .unwrap()
            .retain(|job| !ids.contains(&job.id));
        Ok(MessageResponse {
            message: format!("Deleted {} URLs", ids.len()),
        })
    }

    async fn stats(&self) -> Result<JobStats, RemoteError> {
        self.stats_calls.fetch_add(1, Ordering::SeqCst);
        Ok(JobStats::tally(self.jobs.lock().unwrap().iter()))
    }
}

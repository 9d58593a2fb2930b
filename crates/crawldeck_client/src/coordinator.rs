use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crawldeck_core::{validate_submission, Command, CommandReport, CrawlJob, JobId, Outcome};
use deck_logging::{deck_info, deck_warn};
use futures_util::future::join_all;

use crate::{BulkStrategy, CommandError, RemoteClient, Refresher};

/// Per-id markers for commands that have been sent but not settled.
#[derive(Debug, Clone, Default)]
pub struct PendingMarkers {
    ids: Arc<Mutex<HashSet<JobId>>>,
}

impl PendingMarkers {
    /// Check-and-set. `None` means a command for `id` is already outstanding.
    pub fn try_acquire(&self, id: &JobId) -> Option<PendingGuard> {
        let mut ids = self.ids.lock().unwrap_or_else(|e| e.into_inner());
        if !ids.insert(id.clone()) {
            return None;
        }
        Some(PendingGuard {
            markers: self.clone(),
            id: id.clone(),
        })
    }

    pub fn is_pending(&self, id: &JobId) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clears its marker when dropped, whatever the command's outcome.
#[derive(Debug)]
pub struct PendingGuard {
    markers: PendingMarkers,
    id: JobId,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.markers
            .ids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkOutcome {
    Succeeded,
    Failed(CommandError),
}

/// Per-id outcomes of a bulk command, in the order the ids were given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReport {
    pub command: Command,
    pub outcomes: Vec<(JobId, BulkOutcome)>,
}

impl BulkReport {
    pub fn get(&self, id: &JobId) -> Option<&BulkOutcome> {
        self.outcomes
            .iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, outcome)| outcome)
    }

    pub fn succeeded(&self) -> Vec<&JobId> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == BulkOutcome::Succeeded)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn failed(&self) -> Vec<(&JobId, &CommandError)> {
        self.outcomes
            .iter()
            .filter_map(|(id, outcome)| match outcome {
                BulkOutcome::Failed(err) => Some((id, err)),
                BulkOutcome::Succeeded => None,
            })
            .collect()
    }

    pub fn to_report(&self) -> CommandReport {
        CommandReport {
            command: self.command,
            bulk: true,
            outcomes: self
                .outcomes
                .iter()
                .map(|(id, outcome)| (id.clone(), outcome_of(outcome)))
                .collect(),
        }
    }
}

fn outcome_of(outcome: &BulkOutcome) -> Outcome {
    match outcome {
        BulkOutcome::Succeeded => Outcome::Succeeded,
        BulkOutcome::Failed(CommandError::AlreadyPending(_)) => Outcome::AlreadyPending,
        BulkOutcome::Failed(err) => Outcome::Failed(err.to_string()),
    }
}

/// Single-id counterpart of [`BulkReport::to_report`].
pub fn single_report(id: &JobId, command: Command, result: &Result<(), CommandError>) -> CommandReport {
    let outcome = match result {
        Ok(()) => BulkOutcome::Succeeded,
        Err(err) => BulkOutcome::Failed(err.clone()),
    };
    CommandReport {
        command,
        bulk: false,
        outcomes: vec![(id.clone(), outcome_of(&outcome))],
    }
}

/// Turns user commands into remote calls.
///
/// A command for an id is rejected locally while another command for the
/// same id is outstanding, whether it came from a row button or a bulk
/// action. Every command that reached the service is followed by one store
/// refresh, so the service's view supersedes any local assumption.
pub struct MutationCoordinator {
    client: Arc<dyn RemoteClient>,
    refresher: Arc<Refresher>,
    pending: PendingMarkers,
    strategy: BulkStrategy,
}

impl MutationCoordinator {
    pub fn new(client: Arc<dyn RemoteClient>, refresher: Arc<Refresher>) -> Self {
        Self {
            client,
            refresher,
            pending: PendingMarkers::default(),
            strategy: BulkStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: BulkStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn pending(&self) -> &PendingMarkers {
        &self.pending
    }

    /// Validates locally, then submits. Malformed input never reaches the service,
    /// and a rejected submission leaves the store untouched.
    pub async fn submit_url(&self, raw: &str) -> Result<CrawlJob, CommandError> {
        let url = validate_submission(raw)?;
        let job = self
            .client
            .submit_url(&url)
            .await
            .map_err(CommandError::Submission)?;
        deck_info!("Submitted {} as job {}", url, job.id);
        self.refresher.refresh_jobs().await;
        Ok(job)
    }

    /// Detail lookup. A job deleted since the last refresh is `NotFound`.
    pub async fn get(&self, id: &JobId) -> Result<CrawlJob, CommandError> {
        self.client
            .get_job(id)
            .await
            .map(CrawlJob::normalized)
            .map_err(|err| CommandError::from_remote(id, err))
    }

    pub async fn start(&self, id: &JobId) -> Result<(), CommandError> {
        self.run(id, Command::Start).await
    }

    pub async fn stop(&self, id: &JobId) -> Result<(), CommandError> {
        self.run(id, Command::Stop).await
    }

    pub async fn remove(&self, id: &JobId) -> Result<(), CommandError> {
        self.run(id, Command::Delete).await
    }

    pub async fn rerun(&self, id: &JobId) -> Result<(), CommandError> {
        self.run(id, Command::Rerun).await
    }

    pub async fn run(&self, id: &JobId, command: Command) -> Result<(), CommandError> {
        let result = self.dispatch(id, command).await;
        if !matches!(result, Err(CommandError::AlreadyPending(_))) {
            self.refresher.refresh_jobs().await;
        }
        result
    }

    /// Applies `command` to each id independently; one failure never aborts the rest.
    pub async fn bulk(&self, ids: &[JobId], command: Command) -> BulkReport {
        let mut seen = HashSet::new();
        let ids: Vec<JobId> = ids
            .iter()
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();

        let batched = self.strategy == BulkStrategy::Batched && command != Command::Stop;
        let results = if batched {
            self.dispatch_batched(&ids, command).await
        } else {
            join_all(
                ids.iter()
                    .map(|id| async move { (id.clone(), self.dispatch(id, command).await) }),
            )
            .await
        };

        let reached_service = results
            .iter()
            .any(|(_, result)| !matches!(result, Err(CommandError::AlreadyPending(_))));
        if reached_service {
            self.refresher.refresh_jobs().await;
        }

        let report = BulkReport {
            command,
            outcomes: results
                .into_iter()
                .map(|(id, result)| match result {
                    Ok(()) => (id, BulkOutcome::Succeeded),
                    Err(err) => (id, BulkOutcome::Failed(err)),
                })
                .collect(),
        };
        deck_info!(
            "Bulk {} over {} jobs: {} succeeded",
            command,
            report.outcomes.len(),
            report.succeeded().len()
        );
        report
    }

    async fn dispatch(&self, id: &JobId, command: Command) -> Result<(), CommandError> {
        let Some(_marker) = self.pending.try_acquire(id) else {
            deck_info!("Rejecting {} for {}: a command is already pending", command, id);
            return Err(CommandError::AlreadyPending(id.clone()));
        };
        deck_info!("Sending {} for {}", command, id);
        let result = match command {
            // The service has no separate rerun; it re-triggers analysis through start.
            Command::Start | Command::Rerun => self.client.start(id).await,
            Command::Stop => self.client.stop(id).await,
            Command::Delete => self.client.delete(id).await,
        };
        result.map(|_| ()).map_err(|err| {
            deck_warn!("{} for {} failed: {}", command, id, err);
            CommandError::from_remote(id, err)
        })
    }

    async fn dispatch_batched(
        &self,
        ids: &[JobId],
        command: Command,
    ) -> Vec<(JobId, Result<(), CommandError>)> {
        let mut markers = Vec::with_capacity(ids.len());
        let mut acquired = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(marker) = self.pending.try_acquire(id) {
                markers.push(marker);
                acquired.push(id.clone());
            }
        }

        let result = if acquired.is_empty() {
            Ok(())
        } else {
            deck_info!("Sending bulk {} for {} jobs", command, acquired.len());
            let response = match command {
                Command::Delete => self.client.bulk_delete(&acquired).await,
                _ => self.client.bulk_start(&acquired).await,
            };
            response.map(|_| ()).map_err(|err| {
                deck_warn!("Bulk {} failed: {}", command, err);
                CommandError::Remote(err)
            })
        };
        drop(markers);

        ids.iter()
            .map(|id| {
                let outcome = if acquired.contains(id) {
                    result.clone()
                } else {
                    Err(CommandError::AlreadyPending(id.clone()))
                };
                (id.clone(), outcome)
            })
            .collect()
    }
}

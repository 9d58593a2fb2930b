use std::sync::Arc;

use crawldeck_client::{single_report, CommandError, MutationCoordinator, PollerHandle};
use crawldeck_core::{Effect, Msg, SubmissionFailure};
use deck_logging::{deck_info, deck_warn};
use tokio::sync::mpsc::UnboundedSender;

/// Runs table effects on the runtime and reports each outcome back as a `Msg`.
pub struct EffectRunner {
    coordinator: Arc<MutationCoordinator>,
    poller: Option<PollerHandle>,
    msg_tx: UnboundedSender<Msg>,
}

impl EffectRunner {
    pub fn new(
        coordinator: Arc<MutationCoordinator>,
        poller: PollerHandle,
        msg_tx: UnboundedSender<Msg>,
    ) -> Self {
        Self {
            coordinator,
            poller: Some(poller),
            msg_tx,
        }
    }

    pub fn coordinator(&self) -> &Arc<MutationCoordinator> {
        &self.coordinator
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitUrl { url } => {
                    deck_info!("SubmitUrl url_len={} url={}", url.len(), url);
                    let coordinator = self.coordinator.clone();
                    let msg_tx = self.msg_tx.clone();
                    tokio::spawn(async move {
                        let result = coordinator
                            .submit_url(&url)
                            .await
                            .map(|job| job.id)
                            .map_err(submission_failure);
                        let _ = msg_tx.send(Msg::SubmissionSettled(result));
                    });
                }
                Effect::Run { id, command } => {
                    let coordinator = self.coordinator.clone();
                    let msg_tx = self.msg_tx.clone();
                    tokio::spawn(async move {
                        let result = coordinator.run(&id, command).await;
                        let report = single_report(&id, command, &result);
                        let _ = msg_tx.send(Msg::CommandSettled(report));
                    });
                }
                Effect::Bulk { ids, command } => {
                    let coordinator = self.coordinator.clone();
                    let msg_tx = self.msg_tx.clone();
                    tokio::spawn(async move {
                        let report = coordinator.bulk(&ids, command).await;
                        let _ = msg_tx.send(Msg::CommandSettled(report.to_report()));
                    });
                }
                Effect::TearDown => {
                    if self.poller.take().is_some() {
                        deck_info!("Session ended; polling torn down");
                    }
                }
            }
        }
    }
}

fn submission_failure(err: CommandError) -> SubmissionFailure {
    match err {
        CommandError::Validation(_) => SubmissionFailure::Invalid,
        other => {
            deck_warn!("Submission failed: {}", other);
            SubmissionFailure::Rejected(other.to_string())
        }
    }
}

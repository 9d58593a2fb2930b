use deck_logging::{deck_debug, deck_info};

use crate::msg::{CommandReport, Outcome, SubmissionFailure};
use crate::{
    validate_submission, Command, DeskState, Effect, JobId, Msg, Notice, RowActions, SessionState,
    ValidationError,
};

pub const MSG_EMPTY_INPUT: &str = "Please enter a URL";
pub const MSG_INVALID_INPUT: &str = "Please enter a valid URL";
pub const MSG_SUBMIT_FAILED: &str = "Failed to submit URL. Please try again.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: DeskState, msg: Msg) -> (DeskState, Vec<Effect>) {
    if state.session() == SessionState::SignedOut && is_user_command(&msg) {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::InputChanged(text) => {
            state.set_input(text);
            Vec::new()
        }
        Msg::UrlSubmitted => submit(&mut state),
        Msg::SubmissionSettled(result) => {
            state.set_submitting(false);
            match result {
                Ok(id) => {
                    deck_info!("Submission accepted as job {}", id);
                    state.clear_input();
                    state.set_notice(None);
                }
                Err(SubmissionFailure::Invalid) => {
                    state.set_notice(Some(Notice::error(MSG_INVALID_INPUT)));
                }
                Err(SubmissionFailure::Rejected(reason)) => {
                    deck_info!("Submission rejected: {}", reason);
                    state.set_notice(Some(Notice::error(MSG_SUBMIT_FAILED)));
                }
            }
            Vec::new()
        }
        Msg::SearchChanged(text) => {
            state.query_mut().search = text;
            state.reproject();
            Vec::new()
        }
        Msg::StatusFilterChanged(filter) => {
            state.query_mut().status = filter;
            state.reproject();
            Vec::new()
        }
        Msg::SortClicked(field) => {
            state.query_mut().toggle_sort(field);
            state.reproject();
            Vec::new()
        }
        Msg::RowToggled(id) => {
            if state.job(&id).is_some() {
                state.selection_mut().toggle(id);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SelectAllClicked => {
            let projection = state.projection().clone();
            state.selection_mut().toggle_all(&projection);
            state.mark_dirty();
            Vec::new()
        }
        Msg::SelectionCleared => {
            state.selection_mut().clear();
            state.mark_dirty();
            Vec::new()
        }
        Msg::RowActionClicked(id) => match state.job(&id).map(|job| job.status) {
            Some(status) => {
                let command = RowActions::for_status(status).primary.command();
                run_single(&mut state, id, command)
            }
            None => Vec::new(),
        },
        Msg::DeleteClicked(id) => {
            if state.job(&id).is_some() {
                run_single(&mut state, id, Command::Delete)
            } else {
                Vec::new()
            }
        }
        Msg::BulkClicked(command) => run_bulk(&mut state, command),
        Msg::CommandSettled(report) => {
            settle(&mut state, report);
            Vec::new()
        }
        Msg::StoreReplaced { revision, jobs } => {
            if revision > state.revision() {
                state.apply_snapshot(revision, jobs);
            } else {
                deck_debug!(
                    "Ignoring out-of-date snapshot revision {} (have {})",
                    revision,
                    state.revision()
                );
            }
            Vec::new()
        }
        Msg::StatsUpdated(stats) => {
            state.set_stats(stats);
            Vec::new()
        }
        Msg::RefreshFailed(reason) => {
            state.set_refresh_error(reason);
            Vec::new()
        }
        Msg::SessionExpired => {
            if state.session() == SessionState::Active {
                state.sign_out();
                vec![Effect::TearDown]
            } else {
                Vec::new()
            }
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn is_user_command(msg: &Msg) -> bool {
    matches!(
        msg,
        Msg::UrlSubmitted
            | Msg::RowActionClicked(_)
            | Msg::DeleteClicked(_)
            | Msg::BulkClicked(_)
            | Msg::RowToggled(_)
            | Msg::SelectAllClicked
    )
}

fn submit(state: &mut DeskState) -> Vec<Effect> {
    if state.submitting() {
        return Vec::new();
    }
    match validate_submission(state.input()) {
        Ok(url) => {
            state.set_submitting(true);
            state.set_notice(None);
            vec![Effect::SubmitUrl { url }]
        }
        Err(ValidationError::Empty) => {
            state.set_notice(Some(Notice::error(MSG_EMPTY_INPUT)));
            Vec::new()
        }
        Err(_) => {
            state.set_notice(Some(Notice::error(MSG_INVALID_INPUT)));
            Vec::new()
        }
    }
}

fn run_single(state: &mut DeskState, id: JobId, command: Command) -> Vec<Effect> {
    if state.is_busy(&id) {
        state.set_notice(Some(Notice::info(format!(
            "A command for {id} is still pending"
        ))));
        return Vec::new();
    }
    state.mark_busy([id.clone()]);
    vec![Effect::Run { id, command }]
}

fn run_bulk(state: &mut DeskState, command: Command) -> Vec<Effect> {
    let ids = state.selection().ids();
    if ids.is_empty() || state.is_bulk_in_flight(command) {
        return Vec::new();
    }
    state.begin_bulk(command);
    state.mark_busy(ids.iter().cloned());
    vec![Effect::Bulk { ids, command }]
}

fn settle(state: &mut DeskState, report: CommandReport) {
    if report.bulk {
        state.finish_bulk(report.command);
    }

    let mut failures = Vec::new();
    for (id, outcome) in &report.outcomes {
        match outcome {
            Outcome::Succeeded => state.clear_busy(id),
            // The other command still owns the row.
            Outcome::AlreadyPending => {}
            Outcome::Failed(reason) => {
                state.clear_busy(id);
                failures.push((id, reason));
            }
        }
    }

    let notice = match (report.bulk, failures.as_slice()) {
        (_, []) if report.succeeded() > 0 => Some(Notice::info(format!(
            "{} {} succeeded",
            report.command,
            plural(report.succeeded())
        ))),
        (_, []) => None,
        (false, [(id, reason)]) => Some(Notice::error(format!(
            "Failed to {} {}: {}",
            report.command, id, reason
        ))),
        (_, failed) => Some(Notice::error(format!(
            "{}: {} succeeded, {} failed",
            report.command,
            report.succeeded(),
            failed.len()
        ))),
    };
    state.set_notice(notice);
}

fn plural(count: usize) -> String {
    if count == 1 {
        "1 job".to_string()
    } else {
        format!("{count} jobs")
    }
}

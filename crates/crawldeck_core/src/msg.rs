use crate::{Command, CrawlJob, JobId, JobStats, SortField, StatusFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the URL input box.
    InputChanged(String),
    /// User submitted the current URL input.
    UrlSubmitted,
    /// The submission effect finished.
    SubmissionSettled(Result<JobId, SubmissionFailure>),
    /// User edited the search box.
    SearchChanged(String),
    StatusFilterChanged(StatusFilter),
    /// User clicked a column header.
    SortClicked(SortField),
    /// User ticked or unticked one row.
    RowToggled(JobId),
    /// User clicked the header checkbox.
    SelectAllClicked,
    SelectionCleared,
    /// User clicked the status-dependent button on a row.
    RowActionClicked(JobId),
    DeleteClicked(JobId),
    /// User clicked a bulk button; applies to the current selection.
    BulkClicked(Command),
    /// A single or bulk command effect finished.
    CommandSettled(CommandReport),
    /// The store was replaced with a new snapshot.
    StoreReplaced { revision: u64, jobs: Vec<CrawlJob> },
    StatsUpdated(JobStats),
    /// A background refresh failed; the view keeps the previous snapshot.
    RefreshFailed(String),
    /// The credential was invalidated (logout or a 401).
    SessionExpired,
    /// Render tick to coalesce rendering.
    Tick,
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionFailure {
    /// Rejected locally; nothing was sent.
    Invalid,
    /// The service rejected the submission or could not be reached.
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    /// Another command for the id was still outstanding; nothing was sent.
    AlreadyPending,
    Failed(String),
}

/// Per-id result of a command effect, in dispatch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReport {
    pub command: Command,
    pub bulk: bool,
    pub outcomes: Vec<(JobId, Outcome)>,
}

impl CommandReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == Outcome::Succeeded)
            .count()
    }
}

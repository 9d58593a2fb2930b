use crate::{Command, JobId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitUrl { url: String },
    /// A command from a row button.
    Run { id: JobId, command: Command },
    /// A command over the selection.
    Bulk { ids: Vec<JobId>, command: Command },
    /// Stop polling and discard in-flight fetches.
    TearDown,
}

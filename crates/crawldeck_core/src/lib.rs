//! Crawldeck core: job model, result cache, view projection, selection, and
//! the pure table state machine.
mod actions;
mod effect;
mod model;
mod msg;
mod selection;
mod state;
mod store;
mod update;
mod validate;
mod view;
mod view_model;

pub use actions::{Command, PrimaryAction, RowActions};
pub use effect::Effect;
pub use model::{
    BrokenLink, CrawlJob, CrawlStatus, HeadingCounts, JobId, JobStats, UnknownStatus,
    null_as_empty, UNKNOWN_ERROR,
};
pub use msg::{CommandReport, Msg, Outcome, SubmissionFailure};
pub use selection::SelectionSet;
pub use state::{DeskState, Notice, NoticeLevel, SessionState};
pub use store::{Freshness, ResultStore, StoreEvent, SubscriptionId};
pub use update::{update, MSG_EMPTY_INPUT, MSG_INVALID_INPUT, MSG_SUBMIT_FAILED};
pub use validate::{validate_submission, ValidationError};
pub use view::{project, Projection, SortDirection, SortField, StatusFilter, ViewQuery};
pub use view_model::{DeskViewModel, EmptyState, JobRowView};

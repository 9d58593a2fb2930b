use chrono::{DateTime, Utc};

use crate::{Command, CrawlStatus, JobId, JobStats, Notice, RowActions, SessionState, ViewQuery};

/// Distinguishes "nothing submitted yet" from "the filter hides everything".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyState {
    #[default]
    NoData,
    NoMatches,
    HasRows,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeskViewModel {
    pub session: SessionState,
    pub rows: Vec<JobRowView>,
    pub matched: usize,
    pub total: usize,
    pub empty_state: EmptyState,
    pub selected_count: usize,
    pub all_visible_selected: bool,
    pub query: ViewQuery,
    pub input: String,
    pub submitting: bool,
    pub notice: Option<Notice>,
    pub stats: JobStats,
    /// Set while the last background refresh failed ("failed to load").
    pub refresh_error: Option<String>,
    pub bulk_in_flight: Vec<Command>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub id: JobId,
    pub url: String,
    pub title: String,
    pub status: CrawlStatus,
    pub total_links: u32,
    pub broken_links: u32,
    pub crawled_at: DateTime<Utc>,
    pub error_message: Option<String>,
    pub selected: bool,
    pub busy: bool,
    pub actions: RowActions,
}

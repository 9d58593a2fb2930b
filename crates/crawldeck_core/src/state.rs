use std::collections::BTreeSet;

use crate::view::{project, Projection, ViewQuery};
use crate::view_model::{DeskViewModel, EmptyState, JobRowView};
use crate::{Command, CrawlJob, JobId, JobStats, RowActions, SelectionSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Active,
    SignedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Everything the table presents, driven by [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeskState {
    jobs: Vec<CrawlJob>,
    revision: u64,
    query: ViewQuery,
    projection: Projection,
    selection: SelectionSet,
    input: String,
    submitting: bool,
    notice: Option<Notice>,
    stats: Option<JobStats>,
    refresh_error: Option<String>,
    busy: BTreeSet<JobId>,
    bulk_in_flight: BTreeSet<Command>,
    session: SessionState,
    dirty: bool,
}

impl DeskState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> DeskViewModel {
        let rows = self
            .projection
            .rows
            .iter()
            .map(|job| JobRowView {
                id: job.id.clone(),
                url: job.url.clone(),
                title: job.title.clone(),
                status: job.status,
                total_links: job.total_links(),
                broken_links: job.broken_link_count,
                crawled_at: job.crawled_at,
                error_message: job.error_message.clone(),
                selected: self.selection.contains(&job.id),
                busy: self.busy.contains(&job.id),
                actions: RowActions::for_status(job.status),
            })
            .collect();

        let empty_state = if self.projection.is_store_empty() {
            EmptyState::NoData
        } else if self.projection.is_filtered_empty() {
            EmptyState::NoMatches
        } else {
            EmptyState::HasRows
        };

        DeskViewModel {
            session: self.session,
            rows,
            matched: self.projection.matched,
            total: self.projection.total,
            empty_state,
            selected_count: self.selection.len(),
            all_visible_selected: self.selection.covers(&self.projection),
            query: self.query.clone(),
            input: self.input.clone(),
            submitting: self.submitting,
            notice: self.notice.clone(),
            stats: self.stats.unwrap_or_else(|| JobStats::tally(&self.jobs)),
            refresh_error: self.refresh_error.clone(),
            bulk_in_flight: self.bulk_in_flight.iter().copied().collect(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn session(&self) -> SessionState {
        self.session
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_busy(&self, id: &JobId) -> bool {
        self.busy.contains(id)
    }

    pub fn is_bulk_in_flight(&self, command: Command) -> bool {
        self.bulk_in_flight.contains(&command)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn job(&self, id: &JobId) -> Option<&CrawlJob> {
        self.jobs.iter().find(|job| &job.id == id)
    }

    pub(crate) fn query_mut(&mut self) -> &mut ViewQuery {
        &mut self.query
    }

    pub(crate) fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    pub(crate) fn reproject(&mut self) {
        self.projection = project(&self.jobs, &self.query);
        self.dirty = true;
    }

    /// Adopts a new store snapshot and reconciles the selection against it.
    pub(crate) fn apply_snapshot(&mut self, revision: u64, jobs: Vec<CrawlJob>) {
        self.jobs = jobs;
        self.revision = revision;
        self.refresh_error = None;
        let ids: Vec<JobId> = self.jobs.iter().map(|job| job.id.clone()).collect();
        self.selection.reconcile(&ids);
        self.reproject();
    }

    pub(crate) fn set_input(&mut self, input: String) {
        self.input = input;
        self.dirty = true;
    }

    pub(crate) fn clear_input(&mut self) {
        self.input.clear();
        self.dirty = true;
    }

    pub(crate) fn submitting(&self) -> bool {
        self.submitting
    }

    pub(crate) fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
        self.dirty = true;
    }

    pub(crate) fn set_notice(&mut self, notice: Option<Notice>) {
        self.notice = notice;
        self.dirty = true;
    }

    pub(crate) fn set_stats(&mut self, stats: JobStats) {
        self.stats = Some(stats);
        self.dirty = true;
    }

    pub(crate) fn set_refresh_error(&mut self, reason: String) {
        self.refresh_error = Some(reason);
        self.dirty = true;
    }

    pub(crate) fn mark_busy(&mut self, ids: impl IntoIterator<Item = JobId>) {
        self.busy.extend(ids);
        self.dirty = true;
    }

    pub(crate) fn clear_busy(&mut self, id: &JobId) {
        self.busy.remove(id);
        self.dirty = true;
    }

    pub(crate) fn begin_bulk(&mut self, command: Command) -> bool {
        self.dirty = true;
        self.bulk_in_flight.insert(command)
    }

    pub(crate) fn finish_bulk(&mut self, command: Command) {
        self.bulk_in_flight.remove(&command);
        self.dirty = true;
    }

    pub(crate) fn sign_out(&mut self) {
        self.session = SessionState::SignedOut;
        self.selection.clear();
        self.dirty = true;
    }
}

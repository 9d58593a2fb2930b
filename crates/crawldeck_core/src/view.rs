//! Filter, then sort, a store snapshot into presentation order.

use std::cmp::Ordering;

use crate::model::{CrawlJob, CrawlStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(CrawlStatus),
}

impl StatusFilter {
    pub fn matches(self, status: CrawlStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Url,
    Title,
    Status,
    CrawledAt,
    /// Internal plus external links.
    TotalLinks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Filter and sort parameters the table is currently showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub search: String,
    pub status: StatusFilter,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: StatusFilter::All,
            sort_field: SortField::CrawledAt,
            sort_direction: SortDirection::Descending,
        }
    }
}

impl ViewQuery {
    /// Header-click semantics: the active field flips direction, another field starts ascending.
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_direction = self.sort_direction.flipped();
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Ascending;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Projection {
    pub rows: Vec<CrawlJob>,
    /// Rows surviving the filter (equal to `rows.len()`).
    pub matched: usize,
    /// Jobs in the snapshot before filtering.
    pub total: usize,
}

impl Projection {
    /// Nothing in the store at all.
    pub fn is_store_empty(&self) -> bool {
        self.total == 0
    }

    /// The store has jobs but the filter hides every one.
    pub fn is_filtered_empty(&self) -> bool {
        self.total > 0 && self.matched == 0
    }

    pub fn ids(&self) -> impl Iterator<Item = &crate::JobId> {
        self.rows.iter().map(|job| &job.id)
    }
}

pub fn project(jobs: &[CrawlJob], query: &ViewQuery) -> Projection {
    let needle = query.search.trim().to_lowercase();
    let mut rows: Vec<CrawlJob> = jobs
        .iter()
        .filter(|job| query.status.matches(job.status))
        .filter(|job| matches_search(job, &needle))
        .cloned()
        .collect();

    // `sort_by` is stable, so equal keys keep their filtered order in both directions.
    rows.sort_by(|a, b| {
        let ordering = compare(a, b, query.sort_field);
        match query.sort_direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });

    Projection {
        matched: rows.len(),
        total: jobs.len(),
        rows,
    }
}

fn matches_search(job: &CrawlJob, needle: &str) -> bool {
    needle.is_empty()
        || job.url.to_lowercase().contains(needle)
        || job.title.to_lowercase().contains(needle)
}

fn compare(a: &CrawlJob, b: &CrawlJob, field: SortField) -> Ordering {
    match field {
        SortField::Url => compare_text(&a.url, &b.url),
        SortField::Title => compare_text(&a.title, &b.title),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        SortField::CrawledAt => a.crawled_at.cmp(&b.crawled_at),
        SortField::TotalLinks => a.sortable_total_links().cmp(&b.sortable_total_links()),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

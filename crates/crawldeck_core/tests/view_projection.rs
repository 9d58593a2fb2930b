use chrono::{DateTime, Duration, Utc};
use crawldeck_core::{
    project, CrawlJob, CrawlStatus, SortDirection, SortField, StatusFilter, ViewQuery,
};
use pretty_assertions::assert_eq;

fn base_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

fn completed(id: &str, url: &str, title: &str, internal: u32, external: u32) -> CrawlJob {
    let mut job = CrawlJob::queued(id, url, base_time());
    job.status = CrawlStatus::Completed;
    job.title = title.to_string();
    job.internal_link_count = internal;
    job.external_link_count = external;
    job
}

fn with_status(id: &str, status: CrawlStatus) -> CrawlJob {
    let mut job = CrawlJob::queued(id, format!("https://{id}.example.com"), base_time());
    job.status = status;
    job
}

fn ids(jobs: &[CrawlJob]) -> Vec<&str> {
    jobs.iter().map(|job| job.id.as_str()).collect()
}

fn sorted_by(field: SortField, direction: SortDirection) -> ViewQuery {
    ViewQuery {
        sort_field: field,
        sort_direction: direction,
        ..ViewQuery::default()
    }
}

#[test]
fn search_matches_titles_case_insensitively() {
    let jobs = vec![
        completed("1", "https://example.com", "Example Domain", 1, 0),
        completed("2", "https://github.com", "GitHub", 1, 0),
        completed("3", "https://stackoverflow.com", "Stack Overflow", 1, 0),
    ];
    let query = ViewQuery {
        search: "git".to_string(),
        ..ViewQuery::default()
    };

    let projection = project(&jobs, &query);
    assert_eq!(ids(&projection.rows), vec!["2"]);
    assert_eq!(projection.matched, 1);
    assert_eq!(projection.total, 3);
}

#[test]
fn search_also_matches_urls() {
    let jobs = vec![
        completed("1", "https://docs.rs/tokio", "", 0, 0),
        completed("2", "https://crates.io", "Crates", 0, 0),
    ];
    let query = ViewQuery {
        search: "  DOCS ".to_string(),
        ..ViewQuery::default()
    };

    assert_eq!(ids(&project(&jobs, &query).rows), vec!["1"]);
}

#[test]
fn status_filter_and_search_combine() {
    let mut gh_running = with_status("3", CrawlStatus::Running);
    gh_running.url = "https://github.com/rust-lang".to_string();
    let jobs = vec![
        completed("1", "https://github.com", "GitHub", 2, 2),
        with_status("2", CrawlStatus::Running),
        gh_running,
    ];
    let query = ViewQuery {
        search: "github".to_string(),
        status: StatusFilter::Only(CrawlStatus::Running),
        ..ViewQuery::default()
    };

    assert_eq!(ids(&project(&jobs, &query).rows), vec!["3"]);
}

#[test]
fn total_links_descending_is_stable_and_puts_zero_last() {
    let jobs = vec![
        completed("five", "https://a.example.com", "A", 3, 2),
        completed("twelve-first", "https://b.example.com", "B", 10, 2),
        completed("zero", "https://c.example.com", "C", 0, 0),
        completed("twelve-second", "https://d.example.com", "D", 6, 6),
    ];

    let projection = project(
        &jobs,
        &sorted_by(SortField::TotalLinks, SortDirection::Descending),
    );
    assert_eq!(
        ids(&projection.rows),
        vec!["twelve-first", "twelve-second", "five", "zero"]
    );
}

#[test]
fn unsettled_jobs_sort_as_zero_links() {
    let mut running = with_status("running", CrawlStatus::Running);
    running.internal_link_count = 50;
    let jobs = vec![running, completed("done", "https://x.example.com", "X", 1, 0)];

    let projection = project(
        &jobs,
        &sorted_by(SortField::TotalLinks, SortDirection::Descending),
    );
    assert_eq!(ids(&projection.rows), vec!["done", "running"]);
}

#[test]
fn string_fields_sort_case_insensitively() {
    let jobs = vec![
        completed("1", "https://b.example.com", "beta", 0, 0),
        completed("2", "https://a.example.com", "Alpha", 0, 0),
        completed("3", "https://c.example.com", "Charlie", 0, 0),
    ];

    let by_title = project(&jobs, &sorted_by(SortField::Title, SortDirection::Ascending));
    assert_eq!(ids(&by_title.rows), vec!["2", "1", "3"]);

    let by_url = project(&jobs, &sorted_by(SortField::Url, SortDirection::Descending));
    assert_eq!(ids(&by_url.rows), vec!["3", "1", "2"]);
}

#[test]
fn crawled_at_default_shows_newest_first() {
    let mut old = with_status("old", CrawlStatus::Queued);
    old.crawled_at = base_time() - Duration::hours(2);
    let mut new = with_status("new", CrawlStatus::Queued);
    new.crawled_at = base_time() + Duration::hours(2);
    let jobs = vec![old, with_status("mid", CrawlStatus::Queued), new];

    let projection = project(&jobs, &ViewQuery::default());
    assert_eq!(ids(&projection.rows), vec!["new", "mid", "old"]);
}

#[test]
fn resorting_an_unchanged_key_is_a_no_op() {
    let jobs = vec![
        with_status("a", CrawlStatus::Running),
        with_status("b", CrawlStatus::Queued),
        with_status("c", CrawlStatus::Running),
        with_status("d", CrawlStatus::Queued),
    ];
    let query = sorted_by(SortField::Status, SortDirection::Ascending);

    let first = project(&jobs, &query);
    let second = project(&first.rows, &query);
    assert_eq!(ids(&first.rows), vec!["b", "d", "a", "c"]);
    assert_eq!(first.rows, second.rows);
}

#[test]
fn empty_store_is_distinguished_from_filtered_empty() {
    let empty = project(&[], &ViewQuery::default());
    assert!(empty.is_store_empty());
    assert!(!empty.is_filtered_empty());

    let jobs = vec![with_status("a", CrawlStatus::Queued)];
    let query = ViewQuery {
        status: StatusFilter::Only(CrawlStatus::Error),
        ..ViewQuery::default()
    };
    let filtered = project(&jobs, &query);
    assert!(!filtered.is_store_empty());
    assert!(filtered.is_filtered_empty());
}

#[test]
fn header_clicks_toggle_direction_then_switch_field() {
    let mut query = ViewQuery::default();
    assert_eq!(query.sort_field, SortField::CrawledAt);
    assert_eq!(query.sort_direction, SortDirection::Descending);

    query.toggle_sort(SortField::CrawledAt);
    assert_eq!(query.sort_direction, SortDirection::Ascending);

    query.toggle_sort(SortField::Title);
    assert_eq!(query.sort_field, SortField::Title);
    assert_eq!(query.sort_direction, SortDirection::Ascending);
}

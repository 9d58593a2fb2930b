use chrono::DateTime;
use crawldeck_core::{
    project, CrawlJob, CrawlStatus, JobId, ResultStore, SelectionSet, StatusFilter, ViewQuery,
};

fn job(id: &str, status: CrawlStatus) -> CrawlJob {
    let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let mut job = CrawlJob::queued(id, format!("https://{id}.example.com"), at);
    job.status = status;
    job
}

fn selected(selection: &SelectionSet) -> Vec<String> {
    selection.ids().iter().map(ToString::to_string).collect()
}

#[test]
fn reconcile_drops_ids_missing_from_new_snapshot() {
    let mut store = ResultStore::new();
    store.replace_all(vec![
        job("a", CrawlStatus::Queued),
        job("b", CrawlStatus::Queued),
        job("c", CrawlStatus::Queued),
    ]);
    let mut selection = SelectionSet::new();
    for id in ["a", "b", "c"] {
        selection.toggle(JobId::from(id));
    }

    store.replace_all(vec![job("a", CrawlStatus::Running), job("c", CrawlStatus::Queued)]);
    let dropped = selection.reconcile(&store.ids());

    assert_eq!(dropped, 1);
    assert_eq!(selected(&selection), vec!["a", "c"]);
}

#[test]
fn reconcile_never_re_adds_ids() {
    let mut selection = SelectionSet::new();
    selection.toggle(JobId::from("a"));
    selection.reconcile(&[JobId::from("b")]);
    selection.reconcile(&[JobId::from("a"), JobId::from("b")]);

    assert!(selection.is_empty());
}

#[test]
fn select_all_only_selects_visible_rows() {
    let jobs = vec![
        job("a", CrawlStatus::Running),
        job("b", CrawlStatus::Completed),
        job("c", CrawlStatus::Running),
    ];
    let query = ViewQuery {
        status: StatusFilter::Only(CrawlStatus::Running),
        ..ViewQuery::default()
    };
    let projection = project(&jobs, &query);

    let mut selection = SelectionSet::new();
    selection.select_all(&projection);

    assert_eq!(selected(&selection), vec!["a", "c"]);
    assert!(!selection.contains(&JobId::from("b")));
}

#[test]
fn toggle_all_clears_when_everything_visible_is_selected() {
    let jobs = vec![job("a", CrawlStatus::Queued), job("b", CrawlStatus::Queued)];
    let projection = project(&jobs, &ViewQuery::default());
    let mut selection = SelectionSet::new();

    selection.toggle_all(&projection);
    assert_eq!(selection.len(), 2);
    assert!(selection.covers(&projection));

    selection.toggle_all(&projection);
    assert!(selection.is_empty());
}

#[test]
fn toggle_flips_membership() {
    let mut selection = SelectionSet::new();
    assert!(selection.toggle(JobId::from("a")));
    assert!(!selection.toggle(JobId::from("a")));
    assert!(selection.is_empty());
}

#[test]
fn empty_projection_is_never_covered() {
    let selection = SelectionSet::new();
    assert!(!selection.covers(&project(&[], &ViewQuery::default())));
}

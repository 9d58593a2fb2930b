use crawldeck_core::{
    CrawlJob, DeskViewModel, EmptyState, JobRowView, NoticeLevel, SessionState, SortDirection,
    SortField, StatusFilter,
};

pub fn render(view: &DeskViewModel) -> String {
    let session_label = match view.session {
        SessionState::Active => "Signed in",
        SessionState::SignedOut => "Signed out",
    };
    let stats = &view.stats;
    let mut lines = vec![format!(
        "{} | Jobs: {} shown / {} total | Selected: {} | Queued {} Running {} Completed {} Error {}",
        session_label,
        view.matched,
        view.total,
        view.selected_count,
        stats.queued_crawls,
        stats.running_crawls,
        stats.completed_crawls,
        stats.error_crawls
    )];

    lines.push(format!(
        "Sort: {} {} | Filter: {} | Search: {}",
        sort_label(view.query.sort_field),
        match view.query.sort_direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        },
        filter_label(view.query.status),
        if view.query.search.is_empty() {
            "-".to_string()
        } else {
            format!("\"{}\"", view.query.search)
        }
    ));

    if let Some(err) = &view.refresh_error {
        lines.push(format!("Failed to load results ({err}); showing the last known list"));
    }
    if view.submitting {
        lines.push(format!("Submitting {} ...", view.input));
    }
    if let Some(notice) = &view.notice {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        lines.push(format!("[{tag}] {}", notice.text));
    }
    if !view.bulk_in_flight.is_empty() {
        let labels: Vec<&str> = view.bulk_in_flight.iter().map(|c| c.label()).collect();
        lines.push(format!("Bulk in progress: {}", labels.join(", ")));
    }

    match view.empty_state {
        EmptyState::NoData => lines.push("No URLs submitted yet. Use `add <url>`.".to_string()),
        EmptyState::NoMatches => lines.push("No jobs match the current filters.".to_string()),
        EmptyState::HasRows => {
            let header = if view.all_visible_selected { "[x]" } else { "[ ]" };
            lines.push(format!(
                "{header} {:<10} {:<10} {:>6} {:>6}  {:<16}  {:<12} URL / title",
                "ID", "STATUS", "LINKS", "BROKEN", "CRAWLED", "ACTION"
            ));
            lines.extend(view.rows.iter().map(format_job_row));
        }
    }

    lines.join("\n")
}

fn format_job_row(row: &JobRowView) -> String {
    let check = if row.selected { "[x]" } else { "[ ]" };
    let action = if row.busy {
        "(pending)".to_string()
    } else {
        format!("{} | delete", row.actions.primary.command().label())
    };
    let subject = if row.title.is_empty() {
        row.url.clone()
    } else {
        format!("{} ({})", row.url, row.title)
    };
    let mut text = format!(
        "{check} {:<10} {:<10} {:>6} {:>6}  {:<16}  {:<12} {}",
        row.id.as_str(),
        row.status.label(),
        row.total_links,
        row.broken_links,
        row.crawled_at.format("%Y-%m-%d %H:%M").to_string(),
        action,
        subject
    );
    if let Some(message) = &row.error_message {
        text.push_str(&format!("\n    error: {message}"));
    }
    text
}

/// Multi-line detail of one job, including the analysis payload.
pub fn render_detail(job: &CrawlJob) -> String {
    let mut lines = vec![
        format!("{} [{}] {}", job.id, job.status.label(), job.url),
        format!("  crawled: {}", job.crawled_at.to_rfc3339()),
    ];
    if let Some(message) = &job.error_message {
        lines.push(format!("  error: {message}"));
    }
    if job.status.is_settled() && job.error_message.is_none() {
        let headings = &job.heading_counts;
        lines.push(format!("  title: {}", job.title));
        lines.push(format!("  html version: {}", job.html_version_tag));
        lines.push(format!(
            "  headings: h1 {} h2 {} h3 {} h4 {} h5 {} h6 {}",
            headings.h1, headings.h2, headings.h3, headings.h4, headings.h5, headings.h6
        ));
        lines.push(format!(
            "  links: internal {} external {} broken {}",
            job.internal_link_count, job.external_link_count, job.broken_link_count
        ));
        lines.push(format!(
            "  login form: {}",
            if job.has_login_form { "yes" } else { "no" }
        ));
        for link in &job.broken_links {
            lines.push(format!("    {} {} {}", link.status_code, link.url, link.text));
        }
    }
    lines.join("\n")
}

fn sort_label(field: SortField) -> &'static str {
    match field {
        SortField::Url => "url",
        SortField::Title => "title",
        SortField::Status => "status",
        SortField::CrawledAt => "crawled",
        SortField::TotalLinks => "links",
    }
}

fn filter_label(filter: StatusFilter) -> &'static str {
    match filter {
        StatusFilter::All => "all",
        StatusFilter::Only(status) => status.label(),
    }
}

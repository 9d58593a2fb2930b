use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message recorded on `error` jobs that arrive without one.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Opaque job identifier assigned by the crawl service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    #[default]
    Queued,
    Running,
    Completed,
    Error,
}

impl CrawlStatus {
    pub const ALL: [CrawlStatus; 4] = [
        CrawlStatus::Queued,
        CrawlStatus::Running,
        CrawlStatus::Completed,
        CrawlStatus::Error,
    ];

    /// Wire name, also used as the `status` query value.
    pub fn as_str(self) -> &'static str {
        match self {
            CrawlStatus::Queued => "queued",
            CrawlStatus::Running => "running",
            CrawlStatus::Completed => "completed",
            CrawlStatus::Error => "error",
        }
    }

    /// Capitalized name for display.
    pub fn label(self) -> &'static str {
        match self {
            CrawlStatus::Queued => "Queued",
            CrawlStatus::Running => "Running",
            CrawlStatus::Completed => "Completed",
            CrawlStatus::Error => "Error",
        }
    }

    /// True once analysis has produced a payload (successfully or not).
    pub fn is_settled(self) -> bool {
        matches!(self, CrawlStatus::Completed | CrawlStatus::Error)
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown crawl status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for CrawlStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrawlStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeadingCounts {
    pub h1: u32,
    pub h2: u32,
    pub h3: u32,
    pub h4: u32,
    pub h5: u32,
    pub h6: u32,
}

impl HeadingCounts {
    /// Count for heading level 1 through 6; `None` for any other level.
    pub fn count(&self, level: u8) -> Option<u32> {
        match level {
            1 => Some(self.h1),
            2 => Some(self.h2),
            3 => Some(self.h3),
            4 => Some(self.h4),
            5 => Some(self.h5),
            6 => Some(self.h6),
            _ => None,
        }
    }

    pub fn total(&self) -> u32 {
        self.h1 + self.h2 + self.h3 + self.h4 + self.h5 + self.h6
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenLink {
    pub url: String,
    pub status_code: u16,
    #[serde(default)]
    pub text: String,
}

/// One submitted URL and its crawl/analysis lifecycle, as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlJob {
    pub id: JobId,
    pub url: String,
    pub status: CrawlStatus,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "htmlVersion")]
    pub html_version_tag: String,
    #[serde(default)]
    pub heading_counts: HeadingCounts,
    #[serde(default, rename = "internalLinksCount")]
    pub internal_link_count: u32,
    #[serde(default, rename = "externalLinksCount")]
    pub external_link_count: u32,
    #[serde(default, rename = "brokenLinksCount")]
    pub broken_link_count: u32,
    #[serde(default)]
    pub has_login_form: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub broken_links: Vec<BrokenLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub crawled_at: DateTime<Utc>,
}

impl CrawlJob {
    /// A freshly submitted job with an empty analysis payload.
    pub fn queued(id: impl Into<JobId>, url: impl Into<String>, crawled_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            status: CrawlStatus::Queued,
            title: String::new(),
            html_version_tag: String::new(),
            heading_counts: HeadingCounts::default(),
            internal_link_count: 0,
            external_link_count: 0,
            broken_link_count: 0,
            has_login_form: false,
            broken_links: Vec::new(),
            error_message: None,
            crawled_at,
        }
    }

    /// Enforces the payload invariants on a record received from the service.
    ///
    /// Queued and running jobs carry no analysis payload. Only `error` jobs
    /// carry an error message, and it is never empty.
    pub fn normalized(mut self) -> Self {
        if !self.status.is_settled() {
            self.title.clear();
            self.html_version_tag.clear();
            self.heading_counts = HeadingCounts::default();
            self.internal_link_count = 0;
            self.external_link_count = 0;
            self.broken_link_count = 0;
            self.has_login_form = false;
            self.broken_links.clear();
        }
        match self.status {
            CrawlStatus::Error => {
                let missing = self
                    .error_message
                    .as_deref()
                    .map_or(true, |message| message.trim().is_empty());
                if missing {
                    self.error_message = Some(UNKNOWN_ERROR.to_string());
                }
            }
            _ => self.error_message = None,
        }
        self
    }

    /// Internal plus external links, regardless of status.
    pub fn total_links(&self) -> u32 {
        self.internal_link_count + self.external_link_count
    }

    /// Link total used for ordering: only completed jobs carry a meaningful value.
    pub fn sortable_total_links(&self) -> u32 {
        if self.status == CrawlStatus::Completed {
            self.total_links()
        } else {
            0
        }
    }
}

/// Reads a JSON `null` list as empty.
pub fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Aggregate counts by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub total_crawls: u64,
    pub completed_crawls: u64,
    pub queued_crawls: u64,
    pub running_crawls: u64,
    pub error_crawls: u64,
}

impl JobStats {
    /// Counts a snapshot locally, used until the service has reported its own stats.
    pub fn tally<'a>(jobs: impl IntoIterator<Item = &'a CrawlJob>) -> Self {
        jobs.into_iter().fold(Self::default(), |mut stats, job| {
            stats.total_crawls += 1;
            match job.status {
                CrawlStatus::Queued => stats.queued_crawls += 1,
                CrawlStatus::Running => stats.running_crawls += 1,
                CrawlStatus::Completed => stats.completed_crawls += 1,
                CrawlStatus::Error => stats.error_crawls += 1,
            }
            stats
        })
    }
}

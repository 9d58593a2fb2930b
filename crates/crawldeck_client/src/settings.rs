use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Service root; endpoint paths are appended to it.
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Client-side timeout for each request. Expiry is a `Timeout` failure.
    pub request_timeout: Duration,
    /// Page size used when walking the full listing.
    pub page_limit: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            page_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub jobs_interval: Duration,
    pub stats_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            jobs_interval: Duration::from_secs(5),
            stats_interval: Duration::from_secs(10),
        }
    }
}

/// How bulk start/delete/rerun reach the service. Stop is always per id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BulkStrategy {
    /// One request per id, so every id gets its own outcome.
    #[default]
    PerId,
    /// One bulk request for all ids that acquired their pending marker;
    /// its outcome is reported for each of them.
    Batched,
}

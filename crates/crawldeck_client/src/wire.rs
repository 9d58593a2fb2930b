//! Request and response bodies of the crawl service.

use crawldeck_core::{null_as_empty, CrawlJob, CrawlStatus, JobId, SortDirection, SortField};
use serde::{Deserialize, Serialize};

/// Query parameters of `GET /urls`. Unset fields are left to the service defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<CrawlStatus>,
    pub search: Option<String>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortDirection>,
}

impl ListParams {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub(crate) fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(status) = self.status {
            query.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }
        if let Some(column) = self.sort_by.and_then(sort_column) {
            query.push(("sortBy", column.to_string()));
        }
        if let Some(direction) = self.sort_order {
            let order = match direction {
                SortDirection::Ascending => "asc",
                SortDirection::Descending => "desc",
            };
            query.push(("sortOrder", order.to_string()));
        }
        query
    }
}

/// The service orders by table column. Total links is derived from three
/// columns and has no column of its own, so it is left to the service default.
fn sort_column(field: SortField) -> Option<&'static str> {
    match field {
        SortField::Url => Some("url"),
        SortField::Title => Some("title"),
        SortField::Status => Some("status"),
        SortField::CrawledAt => Some("crawled_at"),
        SortField::TotalLinks => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<CrawlJob>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitRequest<'a> {
    pub url: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct IdsRequest<'a> {
    pub ids: &'a [JobId],
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

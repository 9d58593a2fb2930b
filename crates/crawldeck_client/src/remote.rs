use crawldeck_core::{CrawlJob, JobId, JobStats};
use deck_logging::deck_debug;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::wire::{
    AuthResponse, ErrorBody, IdsRequest, JobPage, ListParams, LoginRequest, MessageResponse,
    RegisterRequest, SubmitRequest,
};
use crate::{ClientSettings, Credential, FailureKind, RemoteError};

/// Typed calls against the crawl service. Holds no state beyond its credential.
#[async_trait::async_trait]
pub trait RemoteClient: Send + Sync {
    /// `POST /urls`; the created job starts out queued.
    async fn submit_url(&self, url: &str) -> Result<CrawlJob, RemoteError>;
    /// `GET /urls` for one page.
    async fn list_jobs(&self, params: &ListParams) -> Result<JobPage, RemoteError>;
    async fn get_job(&self, id: &JobId) -> Result<CrawlJob, RemoteError>;
    async fn start(&self, id: &JobId) -> Result<MessageResponse, RemoteError>;
    async fn stop(&self, id: &JobId) -> Result<MessageResponse, RemoteError>;
    async fn delete(&self, id: &JobId) -> Result<MessageResponse, RemoteError>;
    async fn bulk_start(&self, ids: &[JobId]) -> Result<MessageResponse, RemoteError>;
    async fn bulk_delete(&self, ids: &[JobId]) -> Result<MessageResponse, RemoteError>;
    async fn stats(&self) -> Result<JobStats, RemoteError>;
}

/// Full walks attempted before a listing that keeps changing is reported as a failure.
const LISTING_ATTEMPTS: usize = 3;

/// Walks every page of the listing and returns the concatenation.
///
/// The service pages by offset, so a row inserted or deleted mid-walk shifts
/// the later pages and a live job could be skipped. When the total reported by
/// a later page differs from the first page's, the walk starts over. A listing
/// that never holds still fails with [`FailureKind::ListingChanged`] and the
/// caller keeps its previous snapshot.
pub async fn list_all_jobs(
    client: &dyn RemoteClient,
    page_limit: u32,
) -> Result<Vec<CrawlJob>, RemoteError> {
    let limit = page_limit.max(1);
    for attempt in 1..=LISTING_ATTEMPTS {
        match walk_pages(client, limit).await? {
            Some(jobs) => return Ok(jobs),
            None => deck_debug!("Listing changed during page walk (attempt {})", attempt),
        }
    }
    Err(RemoteError::new(
        FailureKind::ListingChanged,
        format!("listing kept changing across {LISTING_ATTEMPTS} page walks"),
    ))
}

/// One walk over the pages. `None` means the listing moved underneath it.
async fn walk_pages(
    client: &dyn RemoteClient,
    limit: u32,
) -> Result<Option<Vec<CrawlJob>>, RemoteError> {
    let first = client.list_jobs(&ListParams::page(1, limit)).await?;
    let (total, total_pages) = (first.total, first.total_pages);
    let mut jobs = first.data;
    let mut page = 1;
    while page < total_pages {
        page += 1;
        let batch = client.list_jobs(&ListParams::page(page, limit)).await?;
        if batch.total != total || batch.total_pages != total_pages {
            return Ok(None);
        }
        if batch.data.is_empty() {
            break;
        }
        jobs.extend(batch.data);
    }
    Ok(Some(jobs))
}

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    http: reqwest::Client,
    base: Url,
    credential: Credential,
}

impl ReqwestClient {
    pub fn new(settings: &ClientSettings, credential: Credential) -> Result<Self, RemoteError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| RemoteError::new(FailureKind::InvalidRequest, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::new(
                FailureKind::InvalidRequest,
                "base url cannot carry a path",
            ));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| RemoteError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            http,
            base,
            credential,
        })
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_present()
    }

    /// `POST /auth/login`; stores the returned token as the credential.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, RemoteError> {
        let request = self
            .request(Method::POST, &["auth", "login"])?
            .json(&LoginRequest { username, password });
        let response: AuthResponse = self.send(request).await?;
        self.credential.set(response.token.clone());
        Ok(response)
    }

    /// `POST /auth/register`; stores the returned token as the credential.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<AuthResponse, RemoteError> {
        let request = self
            .request(Method::POST, &["auth", "register"])?
            .json(&RegisterRequest {
                username,
                password,
                email,
            });
        let response: AuthResponse = self.send(request).await?;
        self.credential.set(response.token.clone());
        Ok(response)
    }

    pub fn logout(&self) {
        self.credential.clear();
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::new(FailureKind::InvalidRequest, "base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, RemoteError> {
        let url = self.endpoint(segments)?;
        Ok(self.http.request(method, url))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let request = match self.credential.bearer() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.credential.invalidate();
            return Err(RemoteError::new(FailureKind::Unauthorized, status.to_string()));
        }
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| status.to_string());
            let kind = if status == StatusCode::NOT_FOUND {
                FailureKind::NotFound
            } else {
                FailureKind::HttpStatus(status.as_u16())
            };
            deck_debug!("Service answered {}: {}", status, message);
            return Err(RemoteError::new(kind, message));
        }

        response.json::<T>().await.map_err(map_reqwest_error)
    }
}

#[async_trait::async_trait]
impl RemoteClient for ReqwestClient {
    async fn submit_url(&self, url: &str) -> Result<CrawlJob, RemoteError> {
        let request = self
            .request(Method::POST, &["urls"])?
            .json(&SubmitRequest { url });
        self.send(request).await
    }

    async fn list_jobs(&self, params: &ListParams) -> Result<JobPage, RemoteError> {
        let mut url = self.endpoint(&["urls"])?;
        let query = params.to_query();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        self.send(self.http.get(url)).await
    }

    async fn get_job(&self, id: &JobId) -> Result<CrawlJob, RemoteError> {
        let request = self.request(Method::GET, &["urls", id.as_str()])?;
        self.send(request).await
    }

    async fn start(&self, id: &JobId) -> Result<MessageResponse, RemoteError> {
        let request = self.request(Method::POST, &["urls", id.as_str(), "start"])?;
        self.send(request).await
    }

    async fn stop(&self, id: &JobId) -> Result<MessageResponse, RemoteError> {
        let request = self.request(Method::POST, &["urls", id.as_str(), "stop"])?;
        self.send(request).await
    }

    async fn delete(&self, id: &JobId) -> Result<MessageResponse, RemoteError> {
        let request = self.request(Method::DELETE, &["urls", id.as_str()])?;
        self.send(request).await
    }

    async fn bulk_start(&self, ids: &[JobId]) -> Result<MessageResponse, RemoteError> {
        let request = self
            .request(Method::POST, &["urls", "bulk-start"])?
            .json(&IdsRequest { ids });
        self.send(request).await
    }

    async fn bulk_delete(&self, ids: &[JobId]) -> Result<MessageResponse, RemoteError> {
        let request = self
            .request(Method::POST, &["urls", "bulk-delete"])?
            .json(&IdsRequest { ids });
        self.send(request).await
    }

    async fn stats(&self) -> Result<JobStats, RemoteError> {
        let request = self.request(Method::GET, &["stats"])?;
        self.send(request).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        return RemoteError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return RemoteError::new(FailureKind::Decode, err.to_string());
    }
    RemoteError::new(FailureKind::Network, err.to_string())
}

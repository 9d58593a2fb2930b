use std::fmt;

use crawldeck_core::{JobId, ValidationError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct RemoteError {
    pub kind: FailureKind,
    pub message: String,
}

impl RemoteError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == FailureKind::NotFound
    }

    /// HTTP status the service answered with, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            FailureKind::HttpStatus(code) => Some(code),
            FailureKind::Unauthorized => Some(401),
            FailureKind::NotFound => Some(404),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request could not be built (bad base url, bad id).
    InvalidRequest,
    HttpStatus(u16),
    /// 401; the credential has been cleared.
    Unauthorized,
    NotFound,
    Timeout,
    Network,
    /// The body did not match the wire contract.
    Decode,
    /// Rows were added or removed on every attempt to walk the listing's pages.
    ListingChanged,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Unauthorized => write!(f, "unauthorized"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "unexpected response body"),
            FailureKind::ListingChanged => write!(f, "listing changed while paging"),
        }
    }
}

/// Errors surfaced to whoever issued a command. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("invalid url: {0}")]
    Validation(#[from] ValidationError),
    #[error("a command for job {0} is already pending")]
    AlreadyPending(JobId),
    #[error("job {0} no longer exists")]
    NotFound(JobId),
    #[error("remote call failed: {0}")]
    Remote(RemoteError),
    #[error("submission failed: {0}")]
    Submission(RemoteError),
}

impl CommandError {
    pub(crate) fn from_remote(id: &JobId, err: RemoteError) -> Self {
        if err.is_not_found() {
            CommandError::NotFound(id.clone())
        } else {
            CommandError::Remote(err)
        }
    }
}

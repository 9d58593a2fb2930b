//! Crawldeck client: remote calls, refresh scheduling and command coordination.
mod coordinator;
mod credential;
mod poller;
mod refresh;
mod remote;
mod settings;
mod types;
mod wire;

pub use coordinator::{
    single_report, BulkOutcome, BulkReport, MutationCoordinator, PendingGuard, PendingMarkers,
};
pub use credential::Credential;
pub use poller::{Poller, PollerHandle};
pub use refresh::{lock_store, RefreshOutcome, Refresher, SharedStore};
pub use remote::{list_all_jobs, RemoteClient, ReqwestClient};
pub use settings::{BulkStrategy, ClientSettings, PollSettings, DEFAULT_BASE_URL};
pub use types::{CommandError, FailureKind, RemoteError};
pub use wire::{AuthResponse, JobPage, ListParams, MessageResponse, UserInfo};

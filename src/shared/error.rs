use crate::domain::entities::RemotePost;
use thiserror::Error;

/// Failures surfaced by a remote gateway binding.
///
/// `Network` and `Protocol` pass through the coordinators untouched;
/// `Conflict` and `NotFound` are protocol outcomes the engine handles
/// itself.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no remote post matches the requested id")]
    NotFound,

    #[error("the remote revision is newer than the guard timestamp")]
    Conflict,

    #[error("network failure: {0}")]
    Network(String),

    #[error("malformed remote response: {0}")]
    Protocol(String),

    #[error("invalid gateway configuration: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Network(err.to_string())
    }
}

/// Failure reported by the local record store.
#[derive(Debug, Error)]
#[error("local store failure: {0}")]
pub struct StoreError(pub String);

/// Engine-level failures returned by the save/sync/trash coordinators.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote reports the post no longer exists. The local record
    /// is preserved until the caller confirms its removal.
    #[error("post {title:?} no longer exists on the remote")]
    Deleted { title: String },

    /// A genuine optimistic-concurrency divergence. Carries the remote
    /// snapshot fetched during resolution; the pending revision chain
    /// is left untouched so the caller can retry.
    #[error("the remote has a conflicting revision of the post")]
    Conflict(Box<RemotePost>),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

use crate::domain::entities::{NewPostPayload, PostChanges, RemotePost};
use crate::domain::value_objects::PostId;
use crate::shared::error::GatewayError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Remote content gateway: the create/update/fetch/trash surface this
/// engine needs from a content server, independent of transport.
///
/// Two bindings implement it: a structured-field JSON binding and a
/// positional XML-RPC binding, both sharing one delta-to-wire-key
/// mapping table.
#[async_trait]
pub trait PostGateway: Send + Sync {
    /// Creates a new post from a full-creation payload. The payload's
    /// idempotency token lets the server deduplicate a retried call.
    async fn create(&self, payload: &NewPostPayload) -> Result<RemotePost, GatewayError>;

    /// Applies a partial update. `guard` is present only for
    /// conflict-sensitive deltas; a guarded call fails with
    /// [`GatewayError::Conflict`] when the remote has advanced past it.
    async fn update(
        &self,
        id: PostId,
        changes: &PostChanges,
        guard: Option<DateTime<Utc>>,
    ) -> Result<RemotePost, GatewayError>;

    /// Fetches the current remote snapshot.
    async fn fetch(&self, id: PostId) -> Result<RemotePost, GatewayError>;

    /// Moves the post to the trash. Idempotent: returns the trashed
    /// snapshot whether or not the post was already trashed.
    async fn trash(&self, id: PostId) -> Result<RemotePost, GatewayError>;
}

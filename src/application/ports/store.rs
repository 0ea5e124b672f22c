use crate::domain::entities::Post;
use crate::domain::value_objects::ForeignId;
use crate::shared::error::StoreError;
use async_trait::async_trait;

/// Boundary to the local persistent record of a post. Transaction
/// mechanics live behind this port; the engine only persists the
/// snapshots it has finished mutating and removes records on the
/// explicit deletion flows.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn upsert(&self, post: &Post) -> Result<(), StoreError>;

    async fn remove(&self, id: &ForeignId) -> Result<(), StoreError>;
}

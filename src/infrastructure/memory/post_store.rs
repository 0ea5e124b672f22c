use crate::application::ports::PostStore;
use crate::domain::entities::Post;
use crate::domain::value_objects::ForeignId;
use crate::shared::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory `PostStore` for tests and embedders that bring their own
/// persistence.
#[derive(Default)]
pub struct MemoryPostStore {
    posts: RwLock<HashMap<ForeignId, Post>>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: &ForeignId) -> Option<Post> {
        self.posts.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.posts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.posts.read().await.is_empty()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn upsert(&self, post: &Post) -> Result<(), StoreError> {
        let mut posts = self.posts.write().await;
        posts.insert(post.foreign_id.clone(), post.clone());
        Ok(())
    }

    async fn remove(&self, id: &ForeignId) -> Result<(), StoreError> {
        let mut posts = self.posts.write().await;
        posts.remove(id);
        Ok(())
    }
}

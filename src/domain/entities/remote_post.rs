use crate::domain::value_objects::{PostId, PostStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The server's view of a post, authoritative only for the moment of
/// the response that carried it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePost {
    pub id: PostId,
    pub date: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub author_id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub slug: Option<String>,
    pub status: Option<PostStatus>,
    pub sticky: Option<bool>,
    pub password: Option<String>,
    pub format: Option<String>,
    pub featured_image: Option<i64>,
    pub categories: Vec<i64>,
    pub tags: Vec<String>,
}

impl RemotePost {
    pub fn new(id: PostId) -> Self {
        Self {
            id,
            date: None,
            modified: None,
            author_id: None,
            title: None,
            content: None,
            excerpt: None,
            slug: None,
            status: None,
            sticky: None,
            password: None,
            format: None,
            featured_image: None,
            categories: Vec::new(),
            tags: Vec::new(),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a post.
///
/// `Unknown` carries any wire value this client does not model yet, so
/// a newer server never forces a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostStatus {
    Draft,
    Publish,
    Scheduled,
    Trash,
    Unknown(String),
}

impl PostStatus {
    pub fn as_wire(&self) -> &str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Publish => "publish",
            PostStatus::Scheduled => "future",
            PostStatus::Trash => "trash",
            PostStatus::Unknown(value) => value.as_str(),
        }
    }

    pub fn is_trash(&self) -> bool {
        matches!(self, PostStatus::Trash)
    }
}

impl Default for PostStatus {
    fn default() -> Self {
        PostStatus::Draft
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

impl From<&str> for PostStatus {
    fn from(value: &str) -> Self {
        match value {
            "draft" => PostStatus::Draft,
            "publish" => PostStatus::Publish,
            "future" => PostStatus::Scheduled,
            "trash" => PostStatus::Trash,
            other => PostStatus::Unknown(other.to_string()),
        }
    }
}

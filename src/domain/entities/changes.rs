use crate::domain::entities::post::Post;
use crate::domain::entities::remote_post::RemotePost;
use crate::domain::value_objects::PostStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed set of fields tracked by the delta builder.
///
/// Adding a trackable field means extending this enum, `ALL`, and the
/// exhaustive matches in [`PostChanges`], so the compiler points at
/// every site that needs to learn about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PostField {
    Author,
    Title,
    Content,
    Excerpt,
    Slug,
    Password,
    Format,
    Sticky,
    FeaturedImage,
    Categories,
    Tags,
    Status,
    Date,
}

impl PostField {
    pub const ALL: [PostField; 13] = [
        PostField::Author,
        PostField::Title,
        PostField::Content,
        PostField::Excerpt,
        PostField::Slug,
        PostField::Password,
        PostField::Format,
        PostField::Sticky,
        PostField::FeaturedImage,
        PostField::Categories,
        PostField::Tags,
        PostField::Status,
        PostField::Date,
    ];

    /// Fields whose updates are guarded by a last-known-modification
    /// timestamp to detect concurrent remote changes.
    pub fn is_conflict_sensitive(self) -> bool {
        matches!(self, PostField::Content | PostField::Date)
    }
}

/// A sparse overlay over a post snapshot: only the fields that were
/// actually changed are present.
///
/// The same shape serves three purposes: the payload of a single
/// revision, the output of the delta builder, and the explicit
/// overrides a caller passes to `save` (e.g. "set status = publish").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostChanges {
    pub author: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub slug: Option<String>,
    pub password: Option<String>,
    pub format: Option<String>,
    pub sticky: Option<bool>,
    pub featured_image: Option<i64>,
    pub categories: Option<Vec<i64>>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
    pub date: Option<DateTime<Utc>>,
}

impl PostChanges {
    pub fn contains(&self, field: PostField) -> bool {
        match field {
            PostField::Author => self.author.is_some(),
            PostField::Title => self.title.is_some(),
            PostField::Content => self.content.is_some(),
            PostField::Excerpt => self.excerpt.is_some(),
            PostField::Slug => self.slug.is_some(),
            PostField::Password => self.password.is_some(),
            PostField::Format => self.format.is_some(),
            PostField::Sticky => self.sticky.is_some(),
            PostField::FeaturedImage => self.featured_image.is_some(),
            PostField::Categories => self.categories.is_some(),
            PostField::Tags => self.tags.is_some(),
            PostField::Status => self.status.is_some(),
            PostField::Date => self.date.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        PostField::ALL.iter().all(|field| !self.contains(*field))
    }

    pub fn changed_fields(&self) -> Vec<PostField> {
        PostField::ALL
            .iter()
            .copied()
            .filter(|field| self.contains(*field))
            .collect()
    }

    pub fn touches_conflict_sensitive(&self) -> bool {
        PostField::ALL
            .iter()
            .any(|field| field.is_conflict_sensitive() && self.contains(*field))
    }

    /// Lays this overlay on top of a snapshot.
    pub fn apply_to(&self, post: &mut Post) {
        for field in PostField::ALL {
            match field {
                PostField::Author => {
                    if let Some(author) = self.author {
                        post.author_id = Some(author);
                    }
                }
                PostField::Title => {
                    if let Some(title) = &self.title {
                        post.title = Some(title.clone());
                    }
                }
                PostField::Content => {
                    if let Some(content) = &self.content {
                        post.content = Some(content.clone());
                    }
                }
                PostField::Excerpt => {
                    if let Some(excerpt) = &self.excerpt {
                        post.excerpt = Some(excerpt.clone());
                    }
                }
                PostField::Slug => {
                    if let Some(slug) = &self.slug {
                        post.slug = Some(slug.clone());
                    }
                }
                PostField::Password => {
                    if let Some(password) = &self.password {
                        post.password = Some(password.clone());
                    }
                }
                PostField::Format => {
                    if let Some(format) = &self.format {
                        post.format = Some(format.clone());
                    }
                }
                PostField::Sticky => {
                    if let Some(sticky) = self.sticky {
                        post.sticky = sticky;
                    }
                }
                PostField::FeaturedImage => {
                    if let Some(featured_image) = self.featured_image {
                        post.featured_image = Some(featured_image);
                    }
                }
                PostField::Categories => {
                    if let Some(categories) = &self.categories {
                        post.categories = categories.clone();
                    }
                }
                PostField::Tags => {
                    if let Some(tags) = &self.tags {
                        post.tags = tags.clone();
                    }
                }
                PostField::Status => {
                    if let Some(status) = &self.status {
                        post.status = status.clone();
                    }
                }
                PostField::Date => {
                    if let Some(date) = self.date {
                        post.date_created = Some(date);
                    }
                }
            }
        }
    }

    /// Merges another overlay on top of this one; the other side wins
    /// for every field it carries.
    pub fn merge_from(&mut self, other: &PostChanges) {
        for field in PostField::ALL {
            match field {
                PostField::Author => {
                    if other.author.is_some() {
                        self.author = other.author;
                    }
                }
                PostField::Title => {
                    if other.title.is_some() {
                        self.title = other.title.clone();
                    }
                }
                PostField::Content => {
                    if other.content.is_some() {
                        self.content = other.content.clone();
                    }
                }
                PostField::Excerpt => {
                    if other.excerpt.is_some() {
                        self.excerpt = other.excerpt.clone();
                    }
                }
                PostField::Slug => {
                    if other.slug.is_some() {
                        self.slug = other.slug.clone();
                    }
                }
                PostField::Password => {
                    if other.password.is_some() {
                        self.password = other.password.clone();
                    }
                }
                PostField::Format => {
                    if other.format.is_some() {
                        self.format = other.format.clone();
                    }
                }
                PostField::Sticky => {
                    if other.sticky.is_some() {
                        self.sticky = other.sticky;
                    }
                }
                PostField::FeaturedImage => {
                    if other.featured_image.is_some() {
                        self.featured_image = other.featured_image;
                    }
                }
                PostField::Categories => {
                    if other.categories.is_some() {
                        self.categories = other.categories.clone();
                    }
                }
                PostField::Tags => {
                    if other.tags.is_some() {
                        self.tags = other.tags.clone();
                    }
                }
                PostField::Status => {
                    if other.status.is_some() {
                        self.status = other.status.clone();
                    }
                }
                PostField::Date => {
                    if other.date.is_some() {
                        self.date = other.date;
                    }
                }
            }
        }
    }

    /// Copies a single field's value from a remote snapshot onto the
    /// post. Used by the selective merge after a partial upload: only
    /// fields the delta carried may be copied.
    pub(crate) fn copy_remote_field(field: PostField, remote: &RemotePost, post: &mut Post) {
        match field {
            PostField::Author => {
                if let Some(author) = remote.author_id {
                    post.author_id = Some(author);
                }
            }
            PostField::Title => {
                if let Some(title) = &remote.title {
                    post.title = Some(title.clone());
                }
            }
            PostField::Content => {
                if let Some(content) = &remote.content {
                    post.content = Some(content.clone());
                }
            }
            PostField::Excerpt => {
                if let Some(excerpt) = &remote.excerpt {
                    post.excerpt = Some(excerpt.clone());
                }
            }
            PostField::Slug => {
                if let Some(slug) = &remote.slug {
                    post.slug = Some(slug.clone());
                }
            }
            PostField::Password => {
                if let Some(password) = &remote.password {
                    post.password = Some(password.clone());
                }
            }
            PostField::Format => {
                if let Some(format) = &remote.format {
                    post.format = Some(format.clone());
                }
            }
            PostField::Sticky => {
                if let Some(sticky) = remote.sticky {
                    post.sticky = sticky;
                }
            }
            PostField::FeaturedImage => {
                if let Some(featured_image) = remote.featured_image {
                    post.featured_image = Some(featured_image);
                }
            }
            PostField::Categories => {
                post.categories = remote.categories.clone();
            }
            PostField::Tags => {
                post.tags = remote.tags.clone();
            }
            PostField::Status => {
                if let Some(status) = &remote.status {
                    post.status = status.clone();
                }
            }
            PostField::Date => {
                if let Some(date) = remote.date {
                    post.date_created = Some(date);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_changes_are_empty() {
        let changes = PostChanges::default();
        assert!(changes.is_empty());
        assert!(changes.changed_fields().is_empty());
        assert!(!changes.touches_conflict_sensitive());
    }

    #[test]
    fn content_marks_changes_conflict_sensitive() {
        let changes = PostChanges {
            content: Some("content-b".to_string()),
            ..Default::default()
        };
        assert!(changes.touches_conflict_sensitive());

        let sticky_only = PostChanges {
            sticky: Some(true),
            ..Default::default()
        };
        assert!(!sticky_only.touches_conflict_sensitive());
    }

    #[test]
    fn merge_from_overrides_win() {
        let mut changes = PostChanges {
            title: Some("title-a".to_string()),
            status: Some(PostStatus::Draft),
            ..Default::default()
        };
        let overrides = PostChanges {
            status: Some(PostStatus::Publish),
            ..Default::default()
        };
        changes.merge_from(&overrides);
        assert_eq!(changes.status, Some(PostStatus::Publish));
        assert_eq!(changes.title.as_deref(), Some("title-a"));
    }
}

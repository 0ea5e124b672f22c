use crate::domain::entities::changes::{PostChanges, PostField};
use crate::domain::entities::post::Post;
use crate::domain::value_objects::ForeignId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The minimal field-level difference between two snapshots.
///
/// `based_on` carries the modification timestamp the computation was
/// based on, set iff the delta touches a conflict-sensitive field; it
/// becomes the optimistic-concurrency guard of the resulting update.
/// An empty delta must never produce a network request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostDelta {
    pub changes: PostChanges,
    pub based_on: Option<DateTime<Utc>>,
}

impl PostDelta {
    /// Computes the delta from `base` to `target`, overlaying the
    /// caller-supplied `overrides` on top. Overrides always win over
    /// chain-derived values for the same field.
    pub fn between(base: &Post, target: &Post, overrides: Option<&PostChanges>) -> PostDelta {
        let mut changes = PostChanges::default();
        for field in PostField::ALL {
            diff_field(field, base, target, &mut changes);
        }
        if let Some(overrides) = overrides {
            changes.merge_from(overrides);
        }
        let based_on = if changes.touches_conflict_sensitive() {
            base.date_modified
        } else {
            None
        };
        PostDelta { changes, based_on }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

fn diff_field(field: PostField, base: &Post, target: &Post, changes: &mut PostChanges) {
    match field {
        PostField::Author => {
            if base.author_id != target.author_id {
                changes.author = target.author_id;
            }
        }
        PostField::Title => {
            if base.title != target.title {
                changes.title = target.title.clone();
            }
        }
        PostField::Content => {
            if base.content != target.content {
                changes.content = target.content.clone();
            }
        }
        PostField::Excerpt => {
            if base.excerpt != target.excerpt {
                changes.excerpt = target.excerpt.clone();
            }
        }
        PostField::Slug => {
            if base.slug != target.slug {
                changes.slug = target.slug.clone();
            }
        }
        PostField::Password => {
            if base.password != target.password {
                changes.password = target.password.clone();
            }
        }
        PostField::Format => {
            if base.format != target.format {
                changes.format = target.format.clone();
            }
        }
        PostField::Sticky => {
            if base.sticky != target.sticky {
                changes.sticky = Some(target.sticky);
            }
        }
        PostField::FeaturedImage => {
            if base.featured_image != target.featured_image {
                changes.featured_image = target.featured_image;
            }
        }
        PostField::Categories => {
            if base.categories != target.categories {
                changes.categories = Some(target.categories.clone());
            }
        }
        PostField::Tags => {
            let base_tags = normalize_tags(&base.tags);
            let target_tags = normalize_tags(&target.tags);
            if base_tags != target_tags {
                changes.tags = Some(target_tags);
            }
        }
        PostField::Status => {
            if base.status != target.status {
                changes.status = Some(target.status.clone());
            }
        }
        PostField::Date => {
            if base.date_created != target.date_created {
                changes.date = target.date_created;
            }
        }
    }
}

/// Trims tag entries and drops empties, e.g. `["tag-1", " tag-2 ", ""]`
/// becomes `["tag-1", "tag-2"]`.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// The full-creation delta for a never-synchronized post.
///
/// Required fields (author, content, status, date, type, title) are
/// always included even when empty or default; author and date have no
/// empty encoding and are included when known. Optional fields appear
/// only when set. The idempotency token rides along as
/// out-of-band metadata so a retried creation is deduplicated
/// server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPostPayload {
    pub foreign_id: ForeignId,
    pub changes: PostChanges,
}

impl NewPostPayload {
    pub fn from_snapshot(target: &Post) -> Self {
        let changes = PostChanges {
            author: target.author_id,
            title: Some(target.title.clone().unwrap_or_default()),
            content: Some(target.content.clone().unwrap_or_default()),
            status: Some(target.status.clone()),
            date: target.date_created,
            excerpt: target.excerpt.clone(),
            slug: target.slug.clone(),
            password: target.password.clone(),
            format: target.format.clone(),
            sticky: target.sticky.then_some(true),
            featured_image: target.featured_image,
            categories: (!target.categories.is_empty()).then(|| target.categories.clone()),
            tags: {
                let tags = normalize_tags(&target.tags);
                (!tags.is_empty()).then_some(tags)
            },
        };
        Self {
            foreign_id: target.foreign_id.clone(),
            changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::PostStatus;
    use chrono::DateTime;

    fn synced_post() -> Post {
        let mut post = Post::new();
        post.remote_id = Some(974.into());
        post.author_id = Some(29043);
        post.title = Some("Hello".to_string());
        post.content = Some("content-a".to_string());
        post.date_created = DateTime::from_timestamp(1_709_852_440, 0);
        post.date_modified = DateTime::from_timestamp(1_709_852_440, 0);
        post
    }

    #[test]
    fn identical_snapshots_produce_an_empty_delta() {
        let post = synced_post();
        let delta = PostDelta::between(&post, &post, None);
        assert!(delta.is_empty());
        assert_eq!(delta.based_on, None);
    }

    #[test]
    fn only_changed_fields_are_included() {
        let base = synced_post();
        let mut target = base.clone();
        target.title = Some("new-title".to_string());

        let delta = PostDelta::between(&base, &target, None);
        assert_eq!(delta.changes.title.as_deref(), Some("new-title"));
        assert_eq!(delta.changes.changed_fields(), vec![PostField::Title]);
    }

    #[test]
    fn content_change_carries_the_base_timestamp() {
        let base = synced_post();
        let mut target = base.clone();
        target.content = Some("content-b".to_string());

        let delta = PostDelta::between(&base, &target, None);
        assert_eq!(delta.based_on, base.date_modified);
    }

    #[test]
    fn sticky_only_delta_has_no_guard() {
        let base = synced_post();
        let mut target = base.clone();
        target.sticky = true;

        let delta = PostDelta::between(&base, &target, None);
        assert_eq!(delta.changes.changed_fields(), vec![PostField::Sticky]);
        assert_eq!(delta.based_on, None);
    }

    #[test]
    fn overrides_win_over_chain_derived_values() {
        let base = synced_post();
        let mut target = base.clone();
        target.status = PostStatus::Draft;

        let overrides = PostChanges {
            status: Some(PostStatus::Publish),
            ..Default::default()
        };
        let delta = PostDelta::between(&base, &target, Some(&overrides));
        assert_eq!(delta.changes.status, Some(PostStatus::Publish));
    }

    #[test]
    fn creation_payload_always_carries_required_fields() {
        let mut post = Post::new();
        post.author_id = Some(29043);
        post.status = PostStatus::Draft;

        let payload = NewPostPayload::from_snapshot(&post);
        assert_eq!(payload.changes.title.as_deref(), Some(""));
        assert_eq!(payload.changes.content.as_deref(), Some(""));
        assert_eq!(payload.changes.status, Some(PostStatus::Draft));
        assert_eq!(payload.changes.author, Some(29043));
        // optional fields stay out until set
        assert_eq!(payload.changes.excerpt, None);
        assert_eq!(payload.changes.sticky, None);
        assert_eq!(payload.changes.categories, None);
        assert_eq!(payload.foreign_id, post.foreign_id);
    }

    #[test]
    fn creation_payload_normalizes_tags() {
        let mut post = Post::new();
        post.tags = vec!["tag-1".to_string(), " tag-2 ".to_string(), "".to_string()];

        let payload = NewPostPayload::from_snapshot(&post);
        assert_eq!(
            payload.changes.tags,
            Some(vec!["tag-1".to_string(), "tag-2".to_string()])
        );
    }
}

use crate::domain::entities::changes::{PostChanges, PostField};
use crate::domain::entities::remote_post::RemotePost;
use crate::domain::entities::revision::{RevisionChain, RevisionId};
use crate::domain::value_objects::{ForeignId, PostId, PostStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The locally known, last-synchronized-or-newly-created state of a
/// post, plus the chain of uncommitted edits layered on top of it.
///
/// Invariants: `remote_id`, once set, never changes; `date_modified`
/// only advances to values learned from a successful server response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub remote_id: Option<PostId>,
    pub foreign_id: ForeignId,
    pub author_id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub slug: Option<String>,
    pub password: Option<String>,
    pub format: Option<String>,
    pub sticky: bool,
    pub featured_image: Option<i64>,
    pub categories: Vec<i64>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub date_created: Option<DateTime<Utc>>,
    pub date_modified: Option<DateTime<Utc>>,
    pub revisions: RevisionChain,
}

impl Post {
    /// A fresh local draft that has never been synchronized.
    pub fn new() -> Self {
        Self {
            remote_id: None,
            foreign_id: ForeignId::generate(),
            author_id: None,
            title: None,
            content: None,
            excerpt: None,
            slug: None,
            password: None,
            format: None,
            sticky: false,
            featured_image: None,
            categories: Vec::new(),
            tags: Vec::new(),
            status: PostStatus::Draft,
            date_created: None,
            date_modified: None,
            revisions: RevisionChain::new(),
        }
    }

    pub fn is_synced(&self) -> bool {
        self.remote_id.is_some()
    }

    /// The last-known title, for user-facing messages.
    pub fn display_title(&self) -> String {
        self.title.clone().unwrap_or_default()
    }

    /// The snapshot obtained by folding the revision chain onto this
    /// post, from the head through `target` inclusive. `None` yields
    /// the bare synchronized snapshot.
    pub fn snapshot_through(&self, target: Option<RevisionId>) -> Post {
        let mut snapshot = self.clone();
        snapshot.revisions = RevisionChain::new();
        if let Some(target) = target {
            for (id, revision) in self.revisions.iter() {
                revision.changes.apply_to(&mut snapshot);
                if id == target {
                    break;
                }
            }
        }
        snapshot
    }

    /// The snapshot the editor currently shows: the chain folded
    /// through its leaf.
    pub fn edited_snapshot(&self) -> Post {
        self.snapshot_through(self.revisions.leaf())
    }

    /// Merges an entire remote snapshot into this post. Safe only when
    /// no local revision is pending past the state the snapshot
    /// acknowledges.
    pub fn apply_remote(&mut self, remote: &RemotePost) {
        if self.remote_id.is_none() {
            self.remote_id = Some(remote.id);
        }
        for field in PostField::ALL {
            PostChanges::copy_remote_field(field, remote, self);
        }
        if let Some(modified) = remote.modified {
            self.date_modified = Some(modified);
        }
    }

    /// Merges only the fields named by `uploaded` from a remote
    /// snapshot. Anything the local edit never touched is left alone,
    /// so a still-pending revision is never silently overwritten. The
    /// baseline timestamp still advances: it was learned from the
    /// response.
    pub fn apply_remote_changes(&mut self, remote: &RemotePost, uploaded: &PostChanges) {
        if self.remote_id.is_none() {
            self.remote_id = Some(remote.id);
        }
        for field in PostField::ALL {
            if uploaded.contains(field) {
                PostChanges::copy_remote_field(field, remote, self);
            }
        }
        if let Some(modified) = remote.modified {
            self.date_modified = Some(modified);
        }
    }
}

impl Default for Post {
    fn default() -> Self {
        Self::new()
    }
}

use crate::application::ports::{PostGateway, PostStore};
use crate::application::services::conflict_resolver::{ConflictResolver, Resolution};
use crate::domain::entities::{NewPostPayload, Post, PostChanges, PostDelta, RemotePost};
use crate::shared::error::{GatewayError, Result, SyncError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The save / sync / trash coordinators over one post.
///
/// All snapshot and chain mutation is synchronous, in-memory work that
/// happens strictly after a successful response, so a dropped in-flight
/// call leaves local state untouched. The service holds no locks and is
/// not reentrant per post: operations take `&mut Post` and the caller
/// serializes them for a given post. Different posts are independent.
pub struct PostSyncService {
    gateway: Arc<dyn PostGateway>,
    store: Arc<dyn PostStore>,
    resolver: ConflictResolver,
}

impl PostSyncService {
    pub fn new(gateway: Arc<dyn PostGateway>, store: Arc<dyn PostStore>) -> Self {
        let resolver = ConflictResolver::new(gateway.clone());
        Self {
            gateway,
            store,
            resolver,
        }
    }

    /// Terminal, caller-initiated commit: uploads the accumulated delta
    /// and collapses the whole revision chain on success.
    pub async fn save(&self, post: &mut Post) -> Result<()> {
        self.save_with(post, None, false).await
    }

    /// [`save`](Self::save) with explicit field overrides (e.g. "set
    /// status = publish") and/or a forced overwrite. With `overwrite`
    /// the timestamp guard is omitted, so the server accepts the write
    /// unconditionally; the delta stays minimal, leaving server-side
    /// changes to untouched fields intact.
    pub async fn save_with(
        &self,
        post: &mut Post,
        changes: Option<&PostChanges>,
        overwrite: bool,
    ) -> Result<()> {
        let target = post.edited_snapshot();

        let remote = match post.remote_id {
            None => {
                let mut creation_target = target;
                if let Some(changes) = changes {
                    changes.apply_to(&mut creation_target);
                }
                let payload = NewPostPayload::from_snapshot(&creation_target);
                let remote = self.gateway.create(&payload).await?;
                info!(post = %post.foreign_id, remote = %remote.id, "created remote post");
                remote
            }
            Some(id) => {
                let delta = PostDelta::between(post, &target, changes);
                if delta.is_empty() {
                    debug!(post = %id, "nothing to save; dropping the revision chain");
                    post.revisions.clear();
                    self.store.upsert(post).await?;
                    return Ok(());
                }
                let guard = if overwrite { None } else { delta.based_on };
                match self.gateway.update(id, &delta.changes, guard).await {
                    Ok(remote) => remote,
                    Err(GatewayError::NotFound) => {
                        return Err(SyncError::Deleted {
                            title: post.display_title(),
                        });
                    }
                    Err(GatewayError::Conflict) => self.recover_conflict(post, &delta).await?,
                    Err(err) => return Err(err.into()),
                }
            }
        };

        // the caller is finished editing: adopt the whole snapshot
        post.apply_remote(&remote);
        post.revisions.clear();
        self.store.upsert(post).await?;
        Ok(())
    }

    /// Opportunistic, non-terminal synchronization: uploads the oldest
    /// pending batch of revisions, merges only what it uploaded, and
    /// preserves anything the editor produced since.
    pub async fn sync(&self, post: &mut Post) -> Result<()> {
        let Some(target_id) = post.revisions.last_ready() else {
            debug!(post = %post.foreign_id, "no revisions ready to synchronize");
            return Ok(());
        };
        let pending_after = post.revisions.next_of(target_id).is_some();
        let target = post.snapshot_through(Some(target_id));

        let (remote, uploaded) = match post.remote_id {
            None => {
                let payload = NewPostPayload::from_snapshot(&target);
                let remote = self.gateway.create(&payload).await?;
                info!(post = %post.foreign_id, remote = %remote.id, "created remote post");
                (remote, payload.changes)
            }
            Some(id) => {
                let delta = PostDelta::between(post, &target, None);
                if delta.is_empty() {
                    // a purely local no-op reversion; no request, but the
                    // uploaded portion of the chain still compacts
                    debug!(post = %id, "revisions cancelled out; compacting the chain");
                    if pending_after {
                        post.revisions.compact_through(target_id);
                    } else {
                        post.revisions.clear();
                    }
                    self.store.upsert(post).await?;
                    return Ok(());
                }
                let remote = match self.gateway.update(id, &delta.changes, delta.based_on).await {
                    Ok(remote) => remote,
                    Err(GatewayError::NotFound) => {
                        return Err(SyncError::Deleted {
                            title: post.display_title(),
                        });
                    }
                    Err(GatewayError::Conflict) => self.recover_conflict(post, &delta).await?,
                    Err(err) => return Err(err.into()),
                };
                (remote, delta.changes)
            }
        };

        if pending_after {
            // a newer revision is still pending; merging anything the
            // delta did not upload could silently overwrite it
            post.apply_remote_changes(&remote, &uploaded);
            post.revisions.compact_through(target_id);
        } else {
            post.apply_remote(&remote);
            post.revisions.clear();
        }
        self.store.upsert(post).await?;
        Ok(())
    }

    /// Deletion with remote-state reconciliation. Pending revisions are
    /// abandoned without uploading: trashing changes status, not
    /// content.
    pub async fn trash(&self, post: &mut Post) -> Result<()> {
        let Some(id) = post.remote_id else {
            debug!(post = %post.foreign_id, "post never synchronized; removing the local record");
            self.store.remove(&post.foreign_id).await?;
            return Ok(());
        };

        post.revisions.clear();

        let remote = match self.gateway.fetch(id).await {
            Ok(remote) => remote,
            Err(GatewayError::NotFound) => {
                return Err(SyncError::Deleted {
                    title: post.display_title(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let remote = if remote.status.as_ref().is_some_and(|status| status.is_trash()) {
            debug!(post = %id, "already trashed on the remote");
            remote
        } else {
            match self.gateway.trash(id).await {
                Ok(remote) => remote,
                Err(GatewayError::NotFound) => {
                    return Err(SyncError::Deleted {
                        title: post.display_title(),
                    });
                }
                Err(err) => return Err(err.into()),
            }
        };

        if let Some(status) = &remote.status {
            post.status = status.clone();
        }
        if let Some(modified) = remote.modified {
            post.date_modified = Some(modified);
        }
        info!(post = %id, "post trashed");
        self.store.upsert(post).await?;
        Ok(())
    }

    /// Resolves a surfaced conflict by adopting the server's revision:
    /// the pending chain is discarded and the post takes the remote
    /// snapshot's values.
    pub async fn resolve_conflict_picking_remote(
        &self,
        post: &mut Post,
        remote: &RemotePost,
    ) -> Result<()> {
        post.revisions.clear();
        post.apply_remote(remote);
        self.store.upsert(post).await?;
        Ok(())
    }

    /// The explicit follow-up to a [`SyncError::Deleted`] confirmation:
    /// removes the local record. Nothing else ever deletes a
    /// synchronized post locally.
    pub async fn delete_local(&self, post: &Post) -> Result<()> {
        self.store.remove(&post.foreign_id).await?;
        Ok(())
    }

    /// Routes an optimistic-concurrency rejection through the resolver.
    /// A spurious conflict is retried once with the fetched timestamp,
    /// transparently; a genuine one aborts with the conflict record and
    /// leaves the chain untouched.
    async fn recover_conflict(&self, post: &Post, delta: &PostDelta) -> Result<RemotePost> {
        match self.resolver.classify(post, delta).await? {
            Resolution::Genuine { remote } => Err(SyncError::Conflict(Box::new(remote))),
            Resolution::Spurious { guard } => {
                let Some(id) = post.remote_id else {
                    return Err(GatewayError::Protocol(
                        "conflict reported for a post without a remote id".to_string(),
                    )
                    .into());
                };
                match self.gateway.update(id, &delta.changes, Some(guard)).await {
                    Ok(remote) => Ok(remote),
                    Err(GatewayError::Conflict) => {
                        // the remote moved again while we were resolving;
                        // give up and hand the latest snapshot to the caller
                        warn!(post = %id, "remote advanced again during conflict recovery");
                        match self.gateway.fetch(id).await {
                            Ok(remote) => Err(SyncError::Conflict(Box::new(remote))),
                            Err(GatewayError::NotFound) => Err(SyncError::Deleted {
                                title: post.display_title(),
                            }),
                            Err(err) => Err(err.into()),
                        }
                    }
                    Err(GatewayError::NotFound) => Err(SyncError::Deleted {
                        title: post.display_title(),
                    }),
                    Err(err) => Err(err.into()),
                }
            }
        }
    }
}

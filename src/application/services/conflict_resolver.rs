use crate::application::ports::PostGateway;
use crate::domain::entities::{Post, PostDelta, RemotePost};
use crate::shared::error::{GatewayError, Result, SyncError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of classifying an optimistic-concurrency rejection.
#[derive(Debug)]
pub(crate) enum Resolution {
    /// The remote's conflict-sensitive fields still match the base the
    /// delta was computed from; the rejection was caused by unrelated
    /// metadata advancing the timestamp. Retry with the fresher guard.
    Spurious { guard: DateTime<Utc> },
    /// The remote genuinely diverged. The caller has to decide.
    Genuine { remote: RemotePost },
}

/// Classifies a gateway `Conflict` as spurious or genuine by fetching
/// the current remote snapshot and comparing its conflict-sensitive
/// fields against the believed base.
pub struct ConflictResolver {
    gateway: Arc<dyn PostGateway>,
}

impl ConflictResolver {
    pub fn new(gateway: Arc<dyn PostGateway>) -> Self {
        Self { gateway }
    }

    pub(crate) async fn classify(&self, base: &Post, delta: &PostDelta) -> Result<Resolution> {
        let Some(id) = base.remote_id else {
            // an update cannot have conflicted without a remote id
            return Err(GatewayError::Protocol(
                "conflict reported for a post without a remote id".to_string(),
            )
            .into());
        };

        let remote = match self.gateway.fetch(id).await {
            Ok(remote) => remote,
            Err(GatewayError::NotFound) => {
                return Err(SyncError::Deleted {
                    title: base.display_title(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        let content_diverged = delta.changes.content.is_some() && remote.content != base.content;
        let date_diverged = delta.changes.date.is_some() && remote.date != base.date_created;

        if content_diverged || date_diverged {
            warn!(post = %id, "remote revision diverged from the local base");
            return Ok(Resolution::Genuine { remote });
        }

        match remote.modified {
            Some(guard) => {
                debug!(post = %id, "conflict was spurious; retrying with the fetched timestamp");
                Ok(Resolution::Spurious { guard })
            }
            // without a fresher timestamp there is nothing to retry with
            None => Ok(Resolution::Genuine { remote }),
        }
    }
}

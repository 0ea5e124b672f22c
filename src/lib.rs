//! Synchronization and conflict-resolution core for a post-editing
//! client.
//!
//! The engine keeps a locally edited post consistent with a remote
//! content server: it computes minimal change-sets between snapshots,
//! uploads them through a pluggable [`PostGateway`], classifies
//! optimistic-concurrency rejections as spurious or genuine, and merges
//! partial server responses into a local model whose revision chain may
//! still be growing.
//!
//! [`PostSyncService`] hosts the three coordinators: `save` (terminal
//! commit), `sync` (opportunistic upload that preserves newer pending
//! edits), and `trash` (deletion with remote-state reconciliation),
//! plus the primitives a caller needs to resolve surfaced conflicts.
//! Two transport bindings implement the gateway behind one wire-key
//! mapping table: [`RestGateway`] and [`XmlRpcGateway`].

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::ports::{PostGateway, PostStore};
pub use application::services::PostSyncService;
pub use domain::entities::{
    NewPostPayload, Post, PostChanges, PostDelta, PostField, RemotePost, Revision, RevisionChain,
    RevisionId,
};
pub use domain::value_objects::{ForeignId, PostId, PostStatus};
pub use infrastructure::memory::MemoryPostStore;
pub use infrastructure::remote::{RestGateway, XmlRpcGateway};
pub use shared::config::{RestConfig, XmlRpcConfig};
pub use shared::error::{GatewayError, Result, StoreError, SyncError};

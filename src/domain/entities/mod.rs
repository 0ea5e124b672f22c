pub mod changes;
pub mod delta;
pub mod post;
pub mod remote_post;
pub mod revision;

pub use changes::{PostChanges, PostField};
pub use delta::{normalize_tags, NewPostPayload, PostDelta};
pub use post::Post;
pub use remote_post::RemotePost;
pub use revision::{Revision, RevisionChain, RevisionId};

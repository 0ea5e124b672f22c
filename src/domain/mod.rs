pub mod entities;
pub mod value_objects;

pub use entities::{NewPostPayload, Post, PostChanges, PostDelta, PostField, RemotePost};
pub use value_objects::{ForeignId, PostId, PostStatus};

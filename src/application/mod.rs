pub mod ports;
pub mod services;

pub use ports::{PostGateway, PostStore};
pub use services::PostSyncService;

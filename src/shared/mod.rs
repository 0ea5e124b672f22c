pub mod config;
pub mod error;

pub use config::{RestConfig, XmlRpcConfig};
pub use error::{GatewayError, Result, StoreError, SyncError};

pub mod memory;
pub mod remote;

pub use memory::MemoryPostStore;
pub use remote::{RestGateway, XmlRpcGateway};

pub mod rest;
pub mod wire;
pub mod xmlrpc;

pub use rest::RestGateway;
pub use xmlrpc::XmlRpcGateway;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for the structured-field (REST) gateway binding.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestConfig {
    /// Base API endpoint, e.g. `https://public-api.example.com/rest/v1.2`.
    pub endpoint: String,
    pub site_id: u64,
    pub auth_token: String,
}

impl fmt::Debug for RestConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RestConfig")
            .field("endpoint", &self.endpoint)
            .field("site_id", &self.site_id)
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}

/// Configuration for the remote-procedure (XML-RPC) gateway binding.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlRpcConfig {
    /// Full endpoint URL, e.g. `https://example.com/xmlrpc.php`.
    pub endpoint: String,
    pub blog_id: u32,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for XmlRpcConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("XmlRpcConfig")
            .field("endpoint", &self.endpoint)
            .field("blog_id", &self.blog_id)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Validates and canonicalizes a gateway endpoint.
pub(crate) fn normalize_endpoint(raw: &str) -> std::result::Result<String, String> {
    let endpoint = raw.trim();
    if endpoint.is_empty() {
        return Err("endpoint must not be empty".to_string());
    }
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(endpoint.trim_end_matches('/').to_string())
    } else {
        Err("endpoint must include http:// or https://".to_string())
    }
}

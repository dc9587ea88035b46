use secrecy::SecretString;
use serde::Deserialize;

/// Durable store configuration, shared by the resource and session
/// stores
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Backend kind
    #[serde(default)]
    pub kind: StoreKind,
    /// Connection URL for the `distributed-cache` kind; may carry
    /// credentials
    #[serde(default)]
    pub url: Option<SecretString>,
    /// Key prefix for shared backends
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Session entry TTL in seconds (`distributed-cache` session store
    /// only); must outlive a long MCP session
    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::InMemory,
            url: None,
            key_prefix: default_key_prefix(),
            session_ttl_seconds: default_session_ttl(),
        }
    }
}

/// Store backend kinds
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreKind {
    /// Process-local map, for development and tests
    #[default]
    InMemory,
    /// Redis-compatible distributed cache
    DistributedCache,
    /// Document database (external client, not available in this build)
    DocumentDb,
}

fn default_key_prefix() -> String {
    "relay".to_owned()
}

const fn default_session_ttl() -> u64 {
    24 * 60 * 60
}

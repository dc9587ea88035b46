use std::net::SocketAddr;

use serde::Deserialize;

/// HTTP server configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind; defaults to `0.0.0.0:8000`
    #[serde(default)]
    pub listen_address: Option<SocketAddr>,
}

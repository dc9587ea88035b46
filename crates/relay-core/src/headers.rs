//! Well-known header names shared by the gateway and the tool-gateway

use std::sync::OnceLock;

use http::header::{self, HeaderMap, HeaderName};

/// MCP streamable-HTTP session header, extracted uniformly from
/// requests and responses and otherwise treated as opaque
pub static MCP_SESSION_ID: HeaderName = HeaderName::from_static("mcp-session-id");

/// Forwarded principal user id (intra-cluster hops only)
pub static MCP_USER_ID: HeaderName = HeaderName::from_static("x-mcp-userid");

/// Forwarded principal display name
pub static MCP_USER_NAME: HeaderName = HeaderName::from_static("x-mcp-username");

/// Forwarded principal roles, comma-separated
pub static MCP_ROLES: HeaderName = HeaderName::from_static("x-mcp-roles");

/// Development-mode principal user id
pub static DEV_USER_ID: HeaderName = HeaderName::from_static("x-dev-userid");

/// Development-mode principal display name
pub static DEV_USER_NAME: HeaderName = HeaderName::from_static("x-dev-name");

/// Development-mode principal roles, comma-separated
pub static DEV_ROLES: HeaderName = HeaderName::from_static("x-dev-roles");

/// Headers that must not be forwarded through the proxy
///
/// Hop-by-hop headers plus `Host`, which is rewritten for the backend.
static HOP_HEADERS: OnceLock<[HeaderName; 9]> = OnceLock::new();

fn hop_headers() -> &'static [HeaderName] {
    HOP_HEADERS.get_or_init(|| {
        [
            header::CONNECTION,
            HeaderName::from_static("keep-alive"),
            header::PROXY_AUTHENTICATE,
            header::PROXY_AUTHORIZATION,
            header::TE,
            header::TRAILER,
            header::TRANSFER_ENCODING,
            header::UPGRADE,
            header::HOST,
        ]
    })
}

/// Whether a header is hop-by-hop and must be dropped when proxying
pub fn is_hop_header(name: &HeaderName) -> bool {
    hop_headers().contains(name)
}

/// Copy `incoming` minus hop-by-hop headers into a fresh map
pub fn strip_hop_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(incoming.len());
    for (name, value) in incoming {
        if !is_hop_header(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

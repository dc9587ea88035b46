//! Principal propagation across internal hops
//!
//! The gateway forwards the authenticated identity to the tool-gateway
//! in `X-Mcp-*` headers. Only intra-cluster hops may supply them; the
//! edge strips them from untrusted clients before authentication runs.

use http::header::{HeaderMap, HeaderValue};
use relay_core::Principal;
use relay_core::headers::{DEV_ROLES, DEV_USER_ID, DEV_USER_NAME, MCP_ROLES, MCP_USER_ID, MCP_USER_NAME};

/// Encode the principal into forwarding headers on an outgoing request
pub fn apply_forwarded_identity(headers: &mut HeaderMap, principal: &Principal) {
    if let Ok(value) = HeaderValue::from_str(&principal.user_id) {
        headers.insert(MCP_USER_ID.clone(), value);
    }
    if let Ok(value) = HeaderValue::from_str(&principal.user_name) {
        headers.insert(MCP_USER_NAME.clone(), value);
    }
    if let Ok(value) = HeaderValue::from_str(&principal.roles.join(",")) {
        headers.insert(MCP_ROLES.clone(), value);
    }
}

/// Reconstruct a principal from forwarding headers, if present
pub fn forwarded_principal(headers: &HeaderMap) -> Option<Principal> {
    let user_id = header_str(headers, &MCP_USER_ID)?;
    let user_name = header_str(headers, &MCP_USER_NAME).unwrap_or_else(|| user_id.clone());
    let roles = split_roles(header_str(headers, &MCP_ROLES).as_deref());

    Some(Principal::new(user_id, user_name, roles))
}

/// Synthesize a development-mode principal from `X-Dev-*` headers
pub fn dev_principal(headers: &HeaderMap) -> Option<Principal> {
    let user_id = header_str(headers, &DEV_USER_ID)?;
    let user_name = header_str(headers, &DEV_USER_NAME).unwrap_or_else(|| user_id.clone());
    let roles = split_roles(header_str(headers, &DEV_ROLES).as_deref());

    Some(Principal::new(user_id, user_name, roles))
}

/// Remove identity-forwarding headers supplied by untrusted clients
pub fn strip_identity_headers(headers: &mut HeaderMap) {
    headers.remove(&MCP_USER_ID);
    headers.remove(&MCP_USER_NAME);
    headers.remove(&MCP_ROLES);
}

fn header_str(headers: &HeaderMap, name: &http::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn split_roles(raw: Option<&str>) -> Vec<String> {
    raw.map(|r| {
        r.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

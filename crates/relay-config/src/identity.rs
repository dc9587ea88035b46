use serde::Deserialize;

/// Identity-provider parameters handed to the token verifier
///
/// The verifier itself is an external collaborator behind the
/// `relay_auth::TokenVerifier` seam; these values configure it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityProviderConfig {
    /// Token issuer URL
    pub issuer: String,
    /// Expected audience
    pub audience: String,
    /// Provider tenant identifier
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Registered client identifier
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Development-mode toggles
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DevelopmentConfig {
    /// When true, a mock principal is synthesized from the
    /// `X-Dev-UserId` / `X-Dev-Name` / `X-Dev-Roles` headers
    #[serde(default)]
    pub mode: bool,
}

use async_trait::async_trait;
use relay_core::Principal;

use crate::error::AuthError;

/// Seam for the identity-provider token validator
///
/// The concrete validator is an external collaborator configured from
/// `identity_provider` settings; the gateway only needs a verified
/// [`Principal`] back.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a bearer token and return the principal it represents
    async fn verify(&self, token: &str) -> Result<Principal, AuthError>;
}

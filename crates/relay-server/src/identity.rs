use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::{HeaderValue, StatusCode, header};
use relay_auth::{TokenVerifier, dev_principal, forwarded_principal, strip_identity_headers};
use relay_core::Principal;

/// Identity-establishment settings for one server role
#[derive(Clone)]
pub struct IdentityContext {
    /// Synthesize a principal from `X-Dev-*` headers
    pub dev_mode: bool,
    /// Accept `X-Mcp-*` forwarded identity (intra-cluster hops only)
    pub trust_forwarded: bool,
    /// External token validator, when wired
    pub verifier: Option<Arc<dyn TokenVerifier>>,
    /// Base URL advertised in authentication challenges
    pub public_origin: Option<url::Url>,
    /// Paths served without authentication
    pub public_paths: Vec<String>,
}

/// Establish the request principal
///
/// Untrusted edges get their forwarded-identity headers stripped before
/// anything reads them. The principal comes from, in order: forwarded
/// identity (trusted hops), dev-mode headers, or bearer-token
/// verification. Requests without any identity are rejected with a
/// challenge.
pub async fn identity_middleware(context: IdentityContext, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if context.public_paths.iter().any(|p| path == *p) {
        return next.run(request).await;
    }

    if !context.trust_forwarded {
        strip_identity_headers(request.headers_mut());
    }

    let mut principal: Option<Principal> = None;

    if context.trust_forwarded {
        principal = forwarded_principal(request.headers());
    }

    if principal.is_none() && context.dev_mode {
        principal = dev_principal(request.headers());
    }

    if principal.is_none()
        && let Some(token) = bearer_token(request.headers())
        && let Some(ref verifier) = context.verifier
    {
        match verifier.verify(token).await {
            Ok(verified) => principal = Some(verified),
            Err(e) => {
                tracing::warn!(error = %e, "token verification failed");
                return challenge(&context, StatusCode::UNAUTHORIZED);
            }
        }
    }

    let Some(principal) = principal else {
        return challenge(&context, StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(principal);
    next.run(request).await
}

fn bearer_token(headers: &http::HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// 401 with challenge metadata pointing at the protected-resource
/// document when a public origin is configured
fn challenge(context: &IdentityContext, status: StatusCode) -> Response {
    let mut response = (status, "authentication required").into_response();

    let value = match context.public_origin {
        Some(ref origin) => {
            format!("Bearer resource_metadata=\"{origin}.well-known/oauth-protected-resource\"")
        }
        None => "Bearer".to_owned(),
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
    }

    response
}

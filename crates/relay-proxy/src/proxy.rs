use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Extension, Json, Router};
use http::header;
use relay_auth::{PermissionEvaluator, apply_forwarded_identity};
use relay_core::headers::{MCP_SESSION_ID, strip_hop_headers};
use relay_core::{AdapterRecord, Operation, Principal};
use relay_store::ResourceStore;

use crate::error::ProxyError;
use crate::rewrite::rewrite_target;
use crate::session::{RoutedBackend, SessionRouter};

/// Shared data-plane state
#[derive(Clone)]
pub struct ProxyState {
    pub adapters: Arc<dyn ResourceStore<AdapterRecord>>,
    pub sessions: Arc<SessionRouter>,
    /// Client for upstream hops; no request timeout, streams are
    /// long-lived and the transport governs idle handling
    pub client: reqwest::Client,
    pub permissions: PermissionEvaluator,
    /// Workload behind the bare `/mcp` entry
    pub tool_gateway_workload: Arc<str>,
}

/// Build the data-plane router
pub fn proxy_router(state: ProxyState) -> Router {
    Router::new()
        .route("/adapters/{name}/mcp", any(adapter_entry))
        .route("/adapters/{name}/mcp/{*rest}", any(adapter_entry_nested))
        .route("/mcp", any(tool_gateway_entry))
        .with_state(state)
}

async fn adapter_entry(
    State(state): State<ProxyState>,
    Extension(principal): Extension<Principal>,
    Path(name): Path<String>,
    request: Request,
) -> Response {
    proxy_to_adapter(&state, &principal, &name, request).await
}

async fn adapter_entry_nested(
    State(state): State<ProxyState>,
    Extension(principal): Extension<Principal>,
    Path((name, _rest)): Path<(String, String)>,
    request: Request,
) -> Response {
    proxy_to_adapter(&state, &principal, &name, request).await
}

async fn tool_gateway_entry(
    State(state): State<ProxyState>,
    Extension(principal): Extension<Principal>,
    request: Request,
) -> Response {
    let workload = Arc::clone(&state.tool_gateway_workload);
    match forward(&state, &workload, 0, Some(&principal), request).await {
        Ok(response) => response,
        Err(e) => error_response(&e),
    }
}

/// Proxy one request to an adapter's replica set
///
/// Adapter-level read permission is resolved before any routing or
/// upstream work happens.
async fn proxy_to_adapter(state: &ProxyState, principal: &Principal, name: &str, request: Request) -> Response {
    let record = match state.adapters.try_get(name).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return error_response(&ProxyError::AdapterNotFound { name: name.to_owned() });
        }
        Err(e) => return error_response(&ProxyError::Store(e)),
    };

    if !state.permissions.allows(principal, &record, Operation::Read) {
        return error_response(&ProxyError::Forbidden);
    }

    match forward(state, name, 2, None, request).await {
        Ok(response) => response,
        Err(e) => error_response(&e),
    }
}

/// Forward a request to the session's backend and stream the response
async fn forward(
    state: &ProxyState,
    workload: &str,
    skip_segments: usize,
    forwarded_identity: Option<&Principal>,
    request: Request,
) -> Result<Response, ProxyError> {
    let session_id = request
        .headers()
        .get(&MCP_SESSION_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let routed = state.sessions.route(workload, session_id.as_deref()).await?;
    let url = rewrite_target(routed.target(), request.uri().path(), request.uri().query(), skip_segments);

    tracing::debug!(workload, %url, existing = matches!(routed, RoutedBackend::Existing { .. }), "proxying request");

    let method = request.method().clone();
    let has_body = request.headers().contains_key(header::CONTENT_LENGTH)
        || request.headers().contains_key(header::TRANSFER_ENCODING);

    let mut headers = strip_hop_headers(request.headers());
    if let Some(principal) = forwarded_identity {
        apply_forwarded_identity(&mut headers, principal);
    }

    let mut builder = state.client.request(method, &url).headers(headers);
    if has_body {
        // Stream the upload; back-pressure propagates to the client
        builder = builder.body(reqwest::Body::wrap_stream(request.into_body().into_data_stream()));
    }

    let upstream = builder
        .send()
        .await
        .map_err(|e| ProxyError::UpstreamConnect(e.to_string()))?;

    // First response of a new session carries the assigned session id;
    // pin it to the chosen backend
    if let RoutedBackend::New { ref target } = routed
        && let Some(assigned) = upstream.headers().get(&MCP_SESSION_ID).and_then(|v| v.to_str().ok())
        && let Err(e) = state.sessions.bind(assigned, target).await
    {
        tracing::warn!(error = %e, "failed to record session binding");
    }

    let status = upstream.status();
    let headers = strip_hop_headers(upstream.headers());

    let mut response = Response::new(axum::body::Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

fn error_response(error: &ProxyError) -> Response {
    use relay_core::HttpError;

    let status = error.status_code();
    let body = serde_json::json!({
        "error": {
            "type": error.error_type(),
            "message": error.client_message(),
        }
    });

    (status, Json(body)).into_response()
}

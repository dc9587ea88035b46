use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Extension, Json, Router};
use http::StatusCode;
use relay_auth::PermissionEvaluator;
use relay_core::headers::MCP_SESSION_ID;
use relay_core::{Operation, Principal, ToolRecord};
use relay_store::ResourceStore;
use serde_json::Value;
use uuid::Uuid;

use crate::cache::ToolListCache;
use crate::dispatch::ToolDispatcher;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, RequestId, initialize_result};

/// Shared tool-gateway state
#[derive(Clone)]
pub struct ToolGatewayState {
    pub tools: Arc<dyn ResourceStore<ToolRecord>>,
    pub cache: Arc<ToolListCache>,
    pub dispatcher: Arc<ToolDispatcher>,
    pub permissions: PermissionEvaluator,
}

/// Build the tool-gateway MCP router
///
/// Serves the MCP streamable-HTTP transport at `/mcp`: JSON-RPC over
/// POST, notifications acknowledged with 202, sessions identified by
/// the `Mcp-Session-Id` header assigned on initialize.
pub fn tool_gateway_router(state: ToolGatewayState) -> Router {
    Router::new().route("/mcp", any(mcp_endpoint)).with_state(state)
}

async fn mcp_endpoint(
    State(state): State<ToolGatewayState>,
    Extension(principal): Extension<Principal>,
    request: axum::extract::Request,
) -> Response {
    let method = request.method().clone();

    if method == http::Method::POST {
        let body = match axum::body::to_bytes(request.into_body(), 4 * 1024 * 1024).await {
            Ok(body) => body,
            Err(_) => return StatusCode::PAYLOAD_TOO_LARGE.into_response(),
        };
        handle_message(&state, &principal, &body).await
    } else if method == http::Method::DELETE {
        // Session teardown; nothing to clean up server-side
        StatusCode::NO_CONTENT.into_response()
    } else {
        // No server-initiated stream is offered
        StatusCode::METHOD_NOT_ALLOWED.into_response()
    }
}

async fn handle_message(state: &ToolGatewayState, principal: &Principal, body: &[u8]) -> Response {
    let request: JsonRpcRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, format!("invalid JSON-RPC message: {e}")).into_response();
        }
    };

    // Notifications get no response body
    let Some(id) = request.id else {
        return StatusCode::ACCEPTED.into_response();
    };

    match request.method.as_str() {
        "initialize" => {
            let result = initialize_result(request.params.as_ref());
            let session_id = Uuid::new_v4().to_string();
            (
                [(MCP_SESSION_ID.clone(), session_id)],
                Json(JsonRpcResponse::success(id, result)),
            )
                .into_response()
        }
        "ping" => Json(JsonRpcResponse::success(id, serde_json::json!({}))).into_response(),
        "tools/list" => list_tools(state, principal, id).await,
        "tools/call" => call_tool(state, principal, id, request.params).await,
        method => Json(JsonRpcResponse::error(id, -32601, format!("Method not found: {method}"))).into_response(),
    }
}

/// All tool definitions visible to the caller
async fn list_tools(state: &ToolGatewayState, principal: &Principal, id: RequestId) -> Response {
    let records = match state.cache.get_or_load(state.tools.as_ref()).await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "tool list unavailable");
            return Json(JsonRpcResponse::error(id, -32603, "tool list is unavailable")).into_response();
        }
    };

    // The cache holds the raw list; permissions apply per caller
    let tools: Vec<Value> = records
        .iter()
        .filter(|record| state.permissions.allows(principal, *record, Operation::Read))
        .filter_map(|record| serde_json::to_value(&record.tool_definition.tool).ok())
        .collect();

    Json(JsonRpcResponse::success(id, serde_json::json!({"tools": tools}))).into_response()
}

async fn call_tool(state: &ToolGatewayState, principal: &Principal, id: RequestId, params: Option<Value>) -> Response {
    let Some(params) = params else {
        return Json(JsonRpcResponse::error(id, -32602, "missing params")).into_response();
    };

    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return Json(JsonRpcResponse::error(id, -32602, "missing tool name")).into_response();
    };

    let arguments = params.get("arguments").cloned().unwrap_or(Value::Object(serde_json::Map::new()));

    let result = state.dispatcher.call(principal, name, arguments).await;
    match serde_json::to_value(&result) {
        Ok(result) => Json(JsonRpcResponse::success(id, result)).into_response(),
        Err(e) => Json(JsonRpcResponse::error(id, -32603, format!("result serialization failed: {e}"))).into_response(),
    }
}

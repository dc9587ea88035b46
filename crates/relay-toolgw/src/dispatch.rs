use std::sync::Arc;

use relay_auth::PermissionEvaluator;
use relay_core::{Operation, Principal, ToolRecord};
use relay_store::ResourceStore;
use rmcp::model::{CallToolResult, Content};
use serde_json::Value;

/// Executes `tools/call` against per-tool backends
///
/// Every failure comes back as a tool result with `isError` set; tool
/// calls never surface protocol errors to the MCP client.
pub struct ToolDispatcher {
    tools: Arc<dyn ResourceStore<ToolRecord>>,
    permissions: PermissionEvaluator,
    client: reqwest::Client,
    namespace: String,
}

impl ToolDispatcher {
    pub fn new(tools: Arc<dyn ResourceStore<ToolRecord>>, client: reqwest::Client, namespace: impl Into<String>) -> Self {
        Self {
            tools,
            permissions: PermissionEvaluator,
            client,
            namespace: namespace.into(),
        }
    }

    /// Call a tool by name with JSON arguments
    pub async fn call(&self, principal: &Principal, name: &str, arguments: Value) -> CallToolResult {
        let record = match self.tools.try_get(name).await {
            Ok(Some(record)) => record,
            Ok(None) => return error_result(format!("Error: Tool '{name}' not found")),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool lookup failed");
                return error_result(format!("Error: Tool '{name}' is currently unavailable"));
            }
        };

        if !self.permissions.allows(principal, &record, Operation::Read) {
            return error_result(format!("Error: You do not have permission to use tool '{name}'"));
        }

        let url = self.execution_url(&record);
        tracing::debug!(tool = name, %url, user = %principal.user_id, "dispatching tool call");

        let response = match self.client.post(&url).json(&arguments).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool backend unreachable");
                return error_result(format!("Error: Failed to connect to inference server: {e}"));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return error_result(format!("Error: Inference server returned {}", status.as_u16()));
        }

        match response.text().await {
            Ok(body) => CallToolResult::success(vec![Content::text(body)]),
            Err(e) => error_result(format!("Error: Failed to read inference response: {e}")),
        }
    }

    /// Cluster-internal execution URL of a tool's backing service
    fn execution_url(&self, record: &ToolRecord) -> String {
        let definition = &record.tool_definition;
        format!(
            "http://{}-service.{}.svc.cluster.local:{}{}",
            record.name(),
            self.namespace,
            definition.port,
            definition.path,
        )
    }
}

fn error_result(message: String) -> CallToolResult {
    CallToolResult::error(vec![Content::text(message)])
}

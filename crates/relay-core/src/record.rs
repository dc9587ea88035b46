use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Persisted record describing one MCP server deployment
///
/// The wire shape uses stable lower-camel-case keys; timestamps are
/// ISO-8601 with offset. `name`, `createdBy` and `createdAt` are
/// immutable after create.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterRecord {
    /// Server-assigned identifier
    pub id: String,
    /// Unique name, lowercase `[a-z0-9-]+`
    pub name: String,
    /// Container image name (without registry)
    pub image_name: String,
    /// Container image tag
    pub image_version: String,
    /// Environment passed to the container; insertion order is irrelevant
    #[serde(default)]
    pub environment_variables: HashMap<String, String>,
    /// Desired replica count, must be positive
    pub replica_count: u32,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// When true the workload-identity pod label is set so the
    /// orchestrator injects a federated credential
    #[serde(default)]
    pub use_workload_identity: bool,
    /// Role values granting non-owner read access
    #[serde(default)]
    pub required_roles: Vec<String>,
    /// Principal that created the record
    pub created_by: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time; equals `created_at` on a fresh record
    pub last_updated_at: DateTime<Utc>,
}

/// Adapter record extended with an MCP tool definition
///
/// Tools are routed through the tool-gateway by name rather than by
/// session ordinal, and their workloads get a cluster-IP service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolRecord {
    #[serde(flatten)]
    pub adapter: AdapterRecord,
    /// MCP tool definition exposed through the tool-gateway
    pub tool_definition: ToolDefinition,
}

impl ToolRecord {
    /// Record name (same as the embedded adapter name)
    pub fn name(&self) -> &str {
        &self.adapter.name
    }
}

/// Tool definition embedded in a tool record
///
/// Invariant: `tool.name` equals the record name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// The MCP tool object advertised to clients
    pub tool: ToolSpec,
    /// Port the backing service listens on
    #[serde(default = "default_tool_port")]
    pub port: u16,
    /// Invocation path on the backing service
    #[serde(default = "default_tool_path")]
    pub path: String,
}

/// MCP tool object: name, description, input schema plus any
/// additional protocol fields, passed through verbatim
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub input_schema: serde_json::Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

const fn default_tool_port() -> u16 {
    443
}

fn default_tool_path() -> String {
    "/score".to_owned()
}

/// Client payload for creating or updating an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterData {
    pub name: String,
    pub image_name: String,
    pub image_version: String,
    #[serde(default)]
    pub environment_variables: HashMap<String, String>,
    #[serde(default = "default_replica_count")]
    pub replica_count: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub use_workload_identity: bool,
    #[serde(default)]
    pub required_roles: Vec<String>,
}

/// Client payload for creating or updating a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolData {
    #[serde(flatten)]
    pub adapter: AdapterData,
    pub tool_definition: ToolDefinition,
}

const fn default_replica_count() -> u32 {
    1
}

/// Whether a name is a valid resource name (`^[a-z0-9-]+$`, non-empty)
pub fn valid_resource_name(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new("^[a-z0-9-]+$").expect("must be valid regex"));
    re.is_match(name)
}

/// Normalize a set of role values: trim whitespace, drop empties,
/// deduplicate case-insensitively keeping the first spelling
pub fn normalize_roles(roles: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();

    for role in roles {
        let trimmed = role.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_ascii_lowercase();
        if seen.contains(&lower) {
            continue;
        }
        seen.push(lower);
        out.push(trimmed.to_owned());
    }

    out
}

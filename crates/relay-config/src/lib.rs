#![allow(clippy::must_use_candidate)]

mod env;
mod loader;

pub mod identity;
pub mod orchestrator;
pub mod server;
pub mod store;

use serde::Deserialize;

pub use identity::{DevelopmentConfig, IdentityProviderConfig};
pub use orchestrator::OrchestratorConfig;
pub use server::ServerConfig;
pub use store::{StoreConfig, StoreKind};

/// Top-level Relay configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Externally visible base URL, used in authentication challenge
    /// metadata
    #[serde(default)]
    pub public_origin: Option<url::Url>,
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Identity-provider token verifier parameters
    #[serde(default)]
    pub identity_provider: Option<IdentityProviderConfig>,
    /// Durable adapter/tool record store
    #[serde(default)]
    pub resource_store: StoreConfig,
    /// Durable session-affinity store
    #[serde(default)]
    pub session_store: StoreConfig,
    /// Orchestrator API and workload layout
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Development-mode toggles
    #[serde(default)]
    pub development: DevelopmentConfig,
    /// Workload name backing the bare `/mcp` entry
    #[serde(default = "default_tool_gateway_workload")]
    pub tool_gateway_workload: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            public_origin: None,
            server: ServerConfig::default(),
            identity_provider: None,
            resource_store: StoreConfig::default(),
            session_store: StoreConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            development: DevelopmentConfig::default(),
            tool_gateway_workload: default_tool_gateway_workload(),
        }
    }
}

fn default_tool_gateway_workload() -> String {
    "toolgateway".to_owned()
}

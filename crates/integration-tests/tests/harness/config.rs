//! Configuration builder for integration tests
//!
//! Defaults to in-memory stores and development-mode identity so tests
//! authenticate with `X-Dev-*` headers.

use relay_config::Config;

/// Builds a test configuration
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.development.mode = true;
        config.orchestrator.registry = "registry.test".to_owned();
        // No token file on test machines
        config.orchestrator.token_path = "/nonexistent/token".to_owned();

        Self { config }
    }

    /// Point the orchestrator client at a mock API server
    pub fn with_orchestrator(mut self, base_url: &str) -> Self {
        self.config.orchestrator.api_url = url::Url::parse(base_url).expect("valid mock orchestrator URL");
        self
    }

    /// Shorten the endpoint-cache TTL (affinity tests change endpoints
    /// between requests)
    pub fn with_endpoints_cache_ttl(mut self, seconds: u64) -> Self {
        self.config.orchestrator.endpoints_cache_ttl_seconds = seconds;
        self
    }

    /// Override the workload behind the bare `/mcp` entry
    pub fn with_tool_gateway_workload(mut self, name: &str) -> Self {
        self.config.tool_gateway_workload = name.to_owned();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

use secrecy::SecretString;
use serde::Deserialize;

/// Orchestrator API and workload-layout configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrchestratorConfig {
    /// Namespace all adapter workloads live in
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Container registry endpoint prefixed to image names
    #[serde(default)]
    pub registry: String,
    /// Orchestrator API base URL; defaults to the in-cluster service
    #[serde(default = "default_api_url")]
    pub api_url: url::Url,
    /// Bearer token for the orchestrator API; read from
    /// `token_path` when unset
    #[serde(default)]
    pub token: Option<SecretString>,
    /// Path to the mounted service-account token
    #[serde(default = "default_token_path")]
    pub token_path: String,
    /// Accept the orchestrator's certificate without verification
    /// (in-cluster CA is usually self-signed)
    #[serde(default)]
    pub tls_skip_verify: bool,
    /// Endpoint-cache TTL in seconds
    #[serde(default = "default_endpoints_ttl")]
    pub endpoints_cache_ttl_seconds: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            registry: String::new(),
            api_url: default_api_url(),
            token: None,
            token_path: default_token_path(),
            tls_skip_verify: false,
            endpoints_cache_ttl_seconds: default_endpoints_ttl(),
        }
    }
}

fn default_namespace() -> String {
    "adapter".to_owned()
}

fn default_api_url() -> url::Url {
    url::Url::parse("https://kubernetes.default.svc").expect("must be a valid URL")
}

fn default_token_path() -> String {
    "/var/run/secrets/kubernetes.io/serviceaccount/token".to_owned()
}

const fn default_endpoints_ttl() -> u64 {
    5
}

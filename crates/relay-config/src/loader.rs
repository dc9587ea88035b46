use std::path::Path;

use secrecy::ExposeSecret;

use crate::{Config, StoreConfig, StoreKind};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded =
            crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if a store backend is unusable or workload
    /// naming constraints are violated
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_store("resource_store", &self.resource_store)?;
        validate_store("session_store", &self.session_store)?;

        if self.orchestrator.namespace.is_empty() {
            anyhow::bail!("orchestrator.namespace must not be empty");
        }

        if self.tool_gateway_workload.is_empty() {
            anyhow::bail!("tool_gateway_workload must not be empty");
        }

        if self.session_store.session_ttl_seconds == 0 {
            anyhow::bail!("session_store.session_ttl_seconds must be greater than 0");
        }

        Ok(())
    }
}

fn validate_store(section: &str, store: &StoreConfig) -> anyhow::Result<()> {
    match store.kind {
        StoreKind::InMemory => Ok(()),
        StoreKind::DistributedCache => {
            let Some(ref url) = store.url else {
                anyhow::bail!("{section}.url is required for the distributed-cache kind");
            };
            if url.expose_secret().is_empty() {
                anyhow::bail!("{section}.url must not be empty");
            }
            Ok(())
        }
        StoreKind::DocumentDb => {
            anyhow::bail!("{section}.kind 'document-db' requires the external document-db client and is not available in this build; use 'distributed-cache'")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn distributed_cache_requires_url() {
        let config: Config = toml::from_str(
            r#"
            [resource_store]
            kind = "distributed-cache"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn document_db_is_rejected() {
        let config: Config = toml::from_str(
            r#"
            [session_store]
            kind = "document-db"
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("document-db"));
    }

    #[test]
    fn full_config_parses() {
        let config: Config = toml::from_str(
            r#"
            public_origin = "https://gateway.example.com"
            tool_gateway_workload = "toolgateway"

            [server]
            listen_address = "0.0.0.0:8000"

            [identity_provider]
            issuer = "https://login.example.com/tenant/v2.0"
            audience = "api://relay"
            tenant_id = "tenant"
            client_id = "client"

            [resource_store]
            kind = "distributed-cache"
            url = "redis://cache:6379"
            key_prefix = "relay"

            [session_store]
            kind = "in-memory"

            [orchestrator]
            namespace = "adapter"
            registry = "registry.example.com"

            [development]
            mode = true
            "#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.orchestrator.namespace, "adapter");
        assert_eq!(config.tool_gateway_workload, "toolgateway");
        assert!(config.development.mode);
    }
}

//! In-cluster REST implementation of the orchestrator seam
//!
//! Talks to the orchestrator's API server with the mounted
//! service-account token. Only the handful of operations the gateway
//! needs are mapped; everything else stays behind the trait.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use relay_config::OrchestratorConfig;
use secrecy::{ExposeSecret, SecretString};

use crate::api::{
    EndpointAddress, OrchestratorApi, OrchestratorError, ReplicaSetPatch, ReplicaSetSpec, ReplicaSetView, ServiceSpec,
};

/// Orchestrator client over the REST API
pub struct RestOrchestrator {
    http: reqwest::Client,
    base: url::Url,
    namespace: String,
    token: Option<SecretString>,
}

impl RestOrchestrator {
    /// Build the client from configuration
    ///
    /// The bearer token comes from `orchestrator.token` or, when unset,
    /// from the mounted service-account token file. A missing token
    /// file is tolerated for off-cluster development against an
    /// unauthenticated API proxy.
    pub fn from_config(config: &OrchestratorConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .danger_accept_invalid_certs(config.tls_skip_verify)
            .build()?;

        let token = match config.token.clone() {
            Some(token) => Some(token),
            None => std::fs::read_to_string(&config.token_path)
                .ok()
                .map(|t| SecretString::from(t.trim().to_owned())),
        };

        Ok(Self {
            http,
            base: config.api_url.clone(),
            namespace: config.namespace.clone(),
            token,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> Result<reqwest::RequestBuilder, OrchestratorError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| OrchestratorError::Transport(format!("invalid API path: {e}")))?;

        let mut builder = self.http.request(method, url);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        Ok(builder)
    }

    async fn check(name: &str, response: reqwest::Response) -> Result<reqwest::Response, OrchestratorError> {
        let status = response.status();
        match status.as_u16() {
            200..=299 => Ok(response),
            404 => Err(OrchestratorError::NotFound { name: name.to_owned() }),
            409 => Err(OrchestratorError::Conflict { name: name.to_owned() }),
            code => {
                let message = response.text().await.unwrap_or_default();
                Err(OrchestratorError::Status { code, message })
            }
        }
    }

    fn stateful_sets(&self) -> String {
        format!("/apis/apps/v1/namespaces/{}/statefulsets", self.namespace)
    }

    fn services(&self) -> String {
        format!("/api/v1/namespaces/{}/services", self.namespace)
    }
}

fn env_json(env: &BTreeMap<String, String>) -> serde_json::Value {
    env.iter()
        .map(|(name, value)| serde_json::json!({"name": name, "value": value}))
        .collect()
}

fn transport(e: reqwest::Error) -> OrchestratorError {
    OrchestratorError::Transport(e.to_string())
}

#[async_trait]
impl OrchestratorApi for RestOrchestrator {
    async fn create_replica_set(&self, spec: &ReplicaSetSpec) -> Result<(), OrchestratorError> {
        let body = serde_json::json!({
            "apiVersion": "apps/v1",
            "kind": "StatefulSet",
            "metadata": {"name": spec.name, "namespace": self.namespace, "labels": {"app": spec.name}},
            "spec": {
                "serviceName": spec.service_name,
                "replicas": spec.replicas,
                "selector": {"matchLabels": {"app": spec.name}},
                "template": {
                    "metadata": {"labels": spec.labels},
                    "spec": {
                        "containers": [{
                            "name": spec.name,
                            "image": spec.image,
                            "ports": [{"containerPort": spec.container_port}],
                            "env": env_json(&spec.env),
                        }]
                    }
                }
            }
        });

        let response = self
            .request(reqwest::Method::POST, &self.stateful_sets())?
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        Self::check(&spec.name, response).await?;
        Ok(())
    }

    async fn get_replica_set(&self, name: &str) -> Result<ReplicaSetView, OrchestratorError> {
        let path = format!("{}/{name}", self.stateful_sets());
        let response = self
            .request(reqwest::Method::GET, &path)?
            .send()
            .await
            .map_err(transport)?;
        let body: serde_json::Value = Self::check(name, response).await?.json().await.map_err(transport)?;

        let container = &body["spec"]["template"]["spec"]["containers"][0];
        let env = container["env"]
            .as_array()
            .map(|vars| {
                vars.iter()
                    .filter_map(|var| {
                        Some((
                            var["name"].as_str()?.to_owned(),
                            var["value"].as_str().unwrap_or_default().to_owned(),
                        ))
                    })
                    .collect()
            })
            .unwrap_or_default();

        #[allow(clippy::cast_possible_truncation)]
        let count = |v: &serde_json::Value| v.as_u64().unwrap_or(0) as u32;

        Ok(ReplicaSetView {
            desired_replicas: count(&body["spec"]["replicas"]),
            ready_replicas: count(&body["status"]["readyReplicas"]),
            updated_replicas: count(&body["status"]["updatedReplicas"]),
            available_replicas: count(&body["status"]["availableReplicas"]),
            image: container["image"].as_str().map(str::to_owned),
            env,
        })
    }

    async fn patch_replica_set(&self, name: &str, patch: &ReplicaSetPatch) -> Result<(), OrchestratorError> {
        let mut spec = serde_json::Map::new();
        if let Some(replicas) = patch.replicas {
            spec.insert("replicas".to_owned(), replicas.into());
        }

        if patch.image.is_some() || patch.env.is_some() {
            // Strategic merge keys containers by name
            let mut container = serde_json::Map::new();
            container.insert("name".to_owned(), name.into());
            if let Some(ref image) = patch.image {
                container.insert("image".to_owned(), image.clone().into());
            }
            if let Some(ref env) = patch.env {
                container.insert("env".to_owned(), env_json(env));
            }

            spec.insert(
                "template".to_owned(),
                serde_json::json!({"spec": {"containers": [container]}}),
            );
        }

        let body = serde_json::json!({"spec": spec});
        let path = format!("{}/{name}", self.stateful_sets());
        let response = self
            .request(reqwest::Method::PATCH, &path)?
            .json(&body)
            .header(http::header::CONTENT_TYPE, "application/strategic-merge-patch+json")
            .send()
            .await
            .map_err(transport)?;
        Self::check(name, response).await?;
        Ok(())
    }

    async fn delete_replica_set(&self, name: &str) -> Result<(), OrchestratorError> {
        let path = format!("{}/{name}", self.stateful_sets());
        let response = self
            .request(reqwest::Method::DELETE, &path)?
            .send()
            .await
            .map_err(transport)?;
        Self::check(name, response).await?;
        Ok(())
    }

    async fn create_service(&self, spec: &ServiceSpec) -> Result<(), OrchestratorError> {
        let mut service_spec = serde_json::json!({
            "selector": spec.selector,
            "ports": [{"port": spec.port, "targetPort": spec.target_port}],
        });
        if spec.headless {
            service_spec["clusterIP"] = "None".into();
        }

        let body = serde_json::json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {"name": spec.name, "namespace": self.namespace},
            "spec": service_spec,
        });

        let response = self
            .request(reqwest::Method::POST, &self.services())?
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        Self::check(&spec.name, response).await?;
        Ok(())
    }

    async fn delete_service(&self, name: &str) -> Result<(), OrchestratorError> {
        let path = format!("{}/{name}", self.services());
        let response = self
            .request(reqwest::Method::DELETE, &path)?
            .send()
            .await
            .map_err(transport)?;
        Self::check(name, response).await?;
        Ok(())
    }

    async fn list_endpoints(&self, service: &str) -> Result<Vec<EndpointAddress>, OrchestratorError> {
        let path = format!("/api/v1/namespaces/{}/endpoints/{service}", self.namespace);
        let response = self
            .request(reqwest::Method::GET, &path)?
            .send()
            .await
            .map_err(transport)?;

        let body: serde_json::Value = match Self::check(service, response).await {
            Ok(response) => response.json().await.map_err(transport)?,
            // A service with no ready pods may have no endpoints object at all
            Err(OrchestratorError::NotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut addresses = Vec::new();
        if let Some(subsets) = body["subsets"].as_array() {
            for subset in subsets {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let port = subset["ports"][0]["port"].as_u64().map(|p| p as u16);

                if let Some(subset_addresses) = subset["addresses"].as_array() {
                    for address in subset_addresses {
                        let Some(ip) = address["ip"].as_str() else { continue };
                        addresses.push(EndpointAddress {
                            ip: ip.to_owned(),
                            hostname: address["hostname"].as_str().map(str::to_owned),
                            port,
                        });
                    }
                }
            }
        }

        Ok(addresses)
    }

    async fn pod_logs(&self, pod: &str, tail_lines: u32) -> Result<String, OrchestratorError> {
        let path = format!(
            "/api/v1/namespaces/{}/pods/{pod}/log?tailLines={tail_lines}",
            self.namespace
        );
        let response = self
            .request(reqwest::Method::GET, &path)?
            .send()
            .await
            .map_err(transport)?;
        Self::check(pod, response).await?.text().await.map_err(transport)
    }
}

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod health;
mod identity;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use relay_auth::TokenVerifier;
use relay_config::Config;
use relay_control::{ResourceService, resource_router};
use relay_core::{AdapterRecord, ToolRecord};
use relay_deploy::{DeploymentManager, NodeInfoProvider, OrchestratorApi, RestOrchestrator};
use relay_proxy::{ProxyState, SessionRouter, proxy_router};
use relay_store::{build_resource_store, build_session_store};
use relay_toolgw::{ToolDispatcher, ToolGatewayState, ToolListCache, tool_gateway_router};
use tower_http::trace::TraceLayer;

pub use identity::IdentityContext;

/// TTL of the tool-gateway's raw tool-list cache
const TOOL_LIST_CACHE_TTL: Duration = Duration::from_secs(300);

/// Which plane this process serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Control plane plus the session-affine data plane
    Gateway,
    /// The built-in MCP server fanning tool calls out by name
    ToolGateway,
}

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration
    ///
    /// The token verifier is an external collaborator; without one,
    /// only development-mode or forwarded identities authenticate.
    ///
    /// # Errors
    ///
    /// Returns an error if a store backend or the orchestrator client
    /// cannot be constructed
    pub fn new(config: &Config, role: Role, verifier: Option<Arc<dyn TokenVerifier>>) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)));

        if config.identity_provider.is_some() && verifier.is_none() {
            tracing::warn!("identity_provider is configured but no token verifier is wired; only dev-mode identities will authenticate");
        }

        let app = match role {
            Role::Gateway => Self::build_gateway(config)?,
            Role::ToolGateway => Self::build_tool_gateway(config)?,
        };

        // Request tracing, then identity (identity runs first)
        let app = app.layer(TraceLayer::new_for_http());

        let identity = IdentityContext {
            dev_mode: config.development.mode,
            // Forwarded identity headers are only trustworthy on the
            // intra-cluster hop into the tool-gateway; the gateway edge
            // strips them before authenticating
            trust_forwarded: role == Role::ToolGateway,
            verifier,
            public_origin: config.public_origin.clone(),
            public_paths: vec!["/health".to_owned()],
        };
        let app = app.layer(axum::middleware::from_fn(move |req, next| {
            let identity = identity.clone();
            async move { identity::identity_middleware(identity, req, next).await }
        }));

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Routes for the gateway role: control plane and reverse proxy
    fn build_gateway(config: &Config) -> anyhow::Result<Router> {
        let orchestrator: Arc<dyn OrchestratorApi> = Arc::new(RestOrchestrator::from_config(&config.orchestrator)?);

        let deploy = Arc::new(DeploymentManager::new(
            Arc::clone(&orchestrator),
            config.orchestrator.registry.clone(),
        ));
        let nodes = Arc::new(NodeInfoProvider::new(
            Arc::clone(&orchestrator),
            config.orchestrator.namespace.clone(),
            Duration::from_secs(config.orchestrator.endpoints_cache_ttl_seconds),
        ));

        let adapters = build_resource_store::<AdapterRecord>(&config.resource_store, "adapter")?;
        let tools = build_resource_store::<ToolRecord>(&config.resource_store, "tool")?;
        let sessions = build_session_store(&config.session_store)?;

        let adapter_service = Arc::new(ResourceService::new(Arc::clone(&adapters), Arc::clone(&deploy)));
        let tool_service = Arc::new(ResourceService::new(Arc::clone(&tools), Arc::clone(&deploy)));

        let proxy_state = ProxyState {
            adapters,
            sessions: Arc::new(SessionRouter::new(sessions, nodes)),
            client: reqwest::Client::new(),
            permissions: relay_auth::PermissionEvaluator,
            tool_gateway_workload: Arc::from(config.tool_gateway_workload.as_str()),
        };

        Ok(Router::new()
            .route("/health", axum::routing::get(health::health_handler))
            .merge(resource_router(adapter_service, "/adapters"))
            .merge(resource_router(tool_service, "/tools"))
            .merge(proxy_router(proxy_state)))
    }

    /// Routes for the tool-gateway role: the aggregated MCP server
    fn build_tool_gateway(config: &Config) -> anyhow::Result<Router> {
        let tools = build_resource_store::<ToolRecord>(&config.resource_store, "tool")?;

        let state = ToolGatewayState {
            tools: Arc::clone(&tools),
            cache: Arc::new(ToolListCache::new(TOOL_LIST_CACHE_TTL)),
            dispatcher: Arc::new(ToolDispatcher::new(
                tools,
                reqwest::Client::new(),
                config.orchestrator.namespace.clone(),
            )),
            permissions: relay_auth::PermissionEvaluator,
        };

        Ok(Router::new()
            .route("/health", axum::routing::get(health::health_handler))
            .merge(tool_gateway_router(state)))
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        Ok(())
    }
}

//! Test server wrapper that starts Relay on a random port

use std::net::SocketAddr;

use relay_config::Config;
use relay_server::{Role, Server};
use tokio_util::sync::CancellationToken;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
}

impl TestServer {
    /// Start a gateway-role test server
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        Self::start_with_role(config, Role::Gateway).await
    }

    /// Start a tool-gateway-role test server
    pub async fn start_tool_gateway(config: Config) -> anyhow::Result<Self> {
        Self::start_with_role(config, Role::ToolGateway).await
    }

    /// Start a test server with the given role
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn start_with_role(config: Config, role: Role) -> anyhow::Result<Self> {
        let server = Server::new(&config, role, None)?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        let client = reqwest::Client::new();

        Ok(Self { addr, shutdown, client })
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
